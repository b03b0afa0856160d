use num_traits::Float;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::bigfloat::BigFloat;
use crate::error::ModelError;
use crate::lattice::Lattice;
use crate::set::{scalar, LinkSpec, Set, SetType};

/// A fixed collection of sets wired together by directed links: the full
/// mutable state of one annealing instance.
///
/// Owned exclusively by one engine for its lifetime, so spin updates need no
/// synchronization. The link graph is static after construction.
pub struct Block<T> {
    sets: Vec<Set<T>>,
    set_size: usize,
}

impl<T: Float> Block<T> {
    /// Wire sets to their links and derive each set's type from its spec:
    /// no targets means Independent, the NoAnneal sentinel freezes the set,
    /// anything else is Dependent.
    ///
    /// Fails fast on empty blocks, ragged spin rows, self-links, and targets
    /// outside the block.
    pub fn new(rows: Vec<Vec<T>>, links: &[LinkSpec]) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyBlock);
        }
        if links.len() != rows.len() {
            return Err(ModelError::SizeMismatch {
                expected: rows.len(),
                actual: links.len(),
            });
        }
        let set_size = rows[0].len();
        let set_count = rows.len();
        for (set_index, row) in rows.iter().enumerate() {
            if row.len() != set_size {
                return Err(ModelError::RaggedBlock {
                    set_index,
                    expected: set_size,
                    actual: row.len(),
                });
            }
        }

        let mut sets = Vec::with_capacity(set_count);
        for (set_index, (row, spec)) in rows.into_iter().zip(links.iter()).enumerate() {
            let (set_type, targets) = match spec {
                LinkSpec::None => (SetType::Independent, vec![]),
                LinkSpec::NoAnneal => (SetType::NoAnneal, vec![]),
                LinkSpec::All => (
                    SetType::Dependent,
                    (0..set_count).filter(|&t| t != set_index).collect(),
                ),
                LinkSpec::Targets(list) => {
                    let mut targets: Vec<usize> = Vec::with_capacity(list.len());
                    for &target in list {
                        if target == set_index {
                            return Err(ModelError::SelfLink { set_index });
                        }
                        if target >= set_count {
                            return Err(ModelError::LinkOutOfRange {
                                set_index,
                                target,
                                set_count,
                            });
                        }
                        if !targets.contains(&target) {
                            targets.push(target);
                        }
                    }
                    if targets.is_empty() {
                        (SetType::Independent, targets)
                    } else {
                        (SetType::Dependent, targets)
                    }
                }
            };
            sets.push(Set::new(row, set_type, targets));
        }

        Ok(Block { sets, set_size })
    }

    #[inline]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    pub fn set_size(&self) -> usize {
        self.set_size
    }

    #[inline]
    pub fn set(&self, index: usize) -> &Set<T> {
        &self.sets[index]
    }

    #[inline]
    pub fn sets(&self) -> &[Set<T>] {
        &self.sets
    }

    /// Recompute P and P_bar for every link of one set from the full product
    /// over all spins.
    ///
    /// Called once per set per sweep before relying on incremental updates:
    /// the caches drift if never refreshed, since repeated near-zero ratio
    /// multiplications accumulate error.
    pub fn recalculate_probabilities(&mut self, set_index: usize) {
        for k in 0..self.sets[set_index].links.len() {
            let target = self.sets[set_index].links[k].target;
            let (prob, inv_prob) =
                link_products(&self.sets[set_index].values, &self.sets[target].values);
            let link = &mut self.sets[set_index].links[k];
            link.prob = prob;
            link.inv_prob = inv_prob;
        }
    }

    /// Write a spin value and keep every link cache of the set consistent.
    ///
    /// The cache is updated incrementally by the new-term/old-term ratio,
    /// except when the old or new spin magnitude is exactly 1: the ratio then
    /// divides by zero (or pins the cache at zero), so the probabilities are
    /// recomputed from scratch. This is a correctness case, not a fast path.
    pub fn set_spin(&mut self, set_index: usize, spin_index: usize, value: T) {
        let old = scalar(self.sets[set_index].values[spin_index]);
        let new = scalar(value);

        if old.abs() == 1.0 || new.abs() == 1.0 {
            self.sets[set_index].values[spin_index] = value;
            self.recalculate_probabilities(set_index);
            return;
        }

        for k in 0..self.sets[set_index].links.len() {
            let target = self.sets[set_index].links[k].target;
            let y = scalar(self.sets[target].values[spin_index]);
            let link = &mut self.sets[set_index].links[k];
            link.prob *= BigFloat::from((1.0 + y * new) / (1.0 + y * old));
            link.inv_prob *= BigFloat::from((1.0 - y * new) / (1.0 - y * old));
        }
        self.sets[set_index].values[spin_index] = value;
    }

    /// Inter-set coupling field for one spin: per link, the log-odds of the
    /// linked set agreeing vs disagreeing with this spin, scaled by the
    /// interaction multiplier.
    ///
    /// Degenerate links contribute nothing: both probabilities exactly zero
    /// (agreement and disagreement both impossible), a linked spin at
    /// magnitude 1 (zero denominator in the closed-form ratio), or a ratio
    /// whose numerator or denominator vanishes outright.
    pub fn interaction_mean_field(
        &self,
        set_index: usize,
        spin_index: usize,
        multiplier: BigFloat,
    ) -> BigFloat {
        if multiplier.is_zero() {
            return BigFloat::ZERO;
        }
        let set = &self.sets[set_index];
        let x = scalar(set.values[spin_index]);
        let mut field = BigFloat::ZERO;
        for link in &set.links {
            if link.prob.is_zero() && link.inv_prob.is_zero() {
                continue;
            }
            let y = scalar(self.sets[link.target].values[spin_index]);
            if y.abs() == 1.0 {
                continue;
            }
            let agree = 1.0 + x * y;
            let disagree = 1.0 - x * y;
            let num = link.prob * ((1.0 + y) / agree) + link.inv_prob * ((1.0 - y) / disagree);
            let den = link.prob * ((1.0 - y) / agree) + link.inv_prob * ((1.0 + y) / disagree);
            if num.is_zero() || den.is_zero() {
                continue;
            }
            field += multiplier * (0.5 * (num / den).ln());
        }
        field
    }

    /// Full mean field for one spin: intra-set term over the other spins of
    /// the same set, weighted by the lattice, plus the inter-set coupling
    /// field. The caller gates the coupling term off by passing a zero
    /// multiplier.
    pub fn mean_field(
        &self,
        lattice: &Lattice<T>,
        set_index: usize,
        spin_index: usize,
        multiplier: BigFloat,
    ) -> BigFloat {
        let values = &self.sets[set_index].values;
        let mut intra = 0.0f64;
        for (i, &value) in values.iter().enumerate() {
            if i != spin_index {
                intra += scalar(value) * scalar(lattice.at(i, spin_index));
            }
        }
        self.interaction_mean_field(set_index, spin_index, multiplier) + BigFloat::from(intra)
    }
}

/// Full product of equality and inequality terms over all spins of a pair.
fn link_products<T: Float>(x: &[T], y: &[T]) -> (BigFloat, BigFloat) {
    let mut prob = BigFloat::from(1.0);
    let mut inv_prob = BigFloat::from(1.0);
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dot = scalar(xi) * scalar(yi);
        prob *= BigFloat::from((1.0 + dot) / 2.0);
        inv_prob *= BigFloat::from((1.0 - dot) / 2.0);
    }
    (prob, inv_prob)
}

/// External block template: produces a fresh [`Block`] per run.
///
/// Run construction must be deterministic in `run_index` so reruns with the
/// same seed reproduce bit-identical schedules.
pub trait BlockSource<T>: Sync {
    fn instance(&self, run_index: usize) -> Result<Block<T>, ModelError>;
}

impl<T, F> BlockSource<T> for F
where
    F: Fn(usize) -> Result<Block<T>, ModelError> + Sync,
{
    fn instance(&self, run_index: usize) -> Result<Block<T>, ModelError> {
        self(run_index)
    }
}

/// Template producing blocks with uniform random spins in (-1, 1), seeded
/// per run as `base_seed + run_index`.
pub struct RandomBlockTemplate {
    set_size: usize,
    links: Vec<LinkSpec>,
    base_seed: u64,
}

impl RandomBlockTemplate {
    pub fn new(set_size: usize, links: Vec<LinkSpec>, base_seed: u64) -> Self {
        RandomBlockTemplate {
            set_size,
            links,
            base_seed,
        }
    }
}

impl<T: Float> BlockSource<T> for RandomBlockTemplate {
    fn instance(&self, run_index: usize) -> Result<Block<T>, ModelError> {
        let mut rng = Xoshiro256StarStar::seed_from_u64(self.base_seed + run_index as u64);
        let rows = (0..self.links.len())
            .map(|_| {
                (0..self.set_size)
                    .map(|_| T::from(2.0 * rng.gen::<f64>() - 1.0).unwrap_or_else(T::zero))
                    .collect()
            })
            .collect();
        Block::new(rows, &self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_linked_sets(a: Vec<f64>, b: Vec<f64>) -> Block<f64> {
        Block::new(
            vec![a, b],
            &[LinkSpec::Targets(vec![1]), LinkSpec::Targets(vec![0])],
        )
        .unwrap()
    }

    #[test]
    fn set_types_derive_from_link_specs() {
        let block = Block::new(
            vec![vec![0.1f32; 3]; 4],
            &[
                LinkSpec::None,
                LinkSpec::All,
                LinkSpec::NoAnneal,
                LinkSpec::Targets(vec![1, 1, 0]),
            ],
        )
        .unwrap();
        assert_eq!(block.set(0).set_type(), SetType::Independent);
        assert_eq!(block.set(1).set_type(), SetType::Dependent);
        assert_eq!(block.set(2).set_type(), SetType::NoAnneal);
        assert_eq!(block.set(3).set_type(), SetType::Dependent);
        // ALL links to every other set; duplicates collapse.
        assert_eq!(block.set(1).link_targets().collect::<Vec<_>>(), [0, 2, 3]);
        assert_eq!(block.set(3).link_targets().collect::<Vec<_>>(), [1, 0]);
    }

    #[test]
    fn construction_rejects_bad_links() {
        let rows = || vec![vec![0.0f32; 2]; 2];
        assert!(matches!(
            Block::new(rows(), &[LinkSpec::Targets(vec![0]), LinkSpec::None]),
            Err(ModelError::SelfLink { set_index: 0 })
        ));
        assert!(matches!(
            Block::new(rows(), &[LinkSpec::Targets(vec![5]), LinkSpec::None]),
            Err(ModelError::LinkOutOfRange { target: 5, .. })
        ));
        assert!(matches!(
            Block::new(
                vec![vec![0.0f32; 2], vec![0.0; 3]],
                &[LinkSpec::None, LinkSpec::None]
            ),
            Err(ModelError::RaggedBlock { .. })
        ));
        assert!(matches!(
            Block::<f32>::new(vec![], &[]),
            Err(ModelError::EmptyBlock)
        ));
    }

    #[test]
    fn incremental_update_matches_scratch_recompute() {
        let mut block = two_linked_sets(vec![0.3, -0.7, 0.2, 0.9], vec![-0.4, 0.5, -0.1, 0.6]);
        block.recalculate_probabilities(0);
        block.set_spin(0, 2, 0.55);

        let (prob, inv_prob) = {
            let link = &block.set(0).links[0];
            (link.prob, link.inv_prob)
        };
        block.recalculate_probabilities(0);
        let link = &block.set(0).links[0];
        assert!((prob.ln() - link.prob.ln()).abs() < 1e-9);
        assert!((inv_prob.ln() - link.inv_prob.ln()).abs() < 1e-9);
    }

    #[test]
    fn magnitude_one_spin_forces_scratch_recompute() {
        // Spin 1 sits at exactly +1 against a linked spin at exactly -1, so
        // the equality product is pinned at zero and the incremental ratio
        // would divide by (1 + y*old) = 0. Moving the spin off ±1 must
        // restore a nonzero cache, which only a full recompute can do.
        let mut block = two_linked_sets(vec![0.3, 1.0, 0.2], vec![-0.4, -1.0, -0.1]);
        block.recalculate_probabilities(0);
        assert!(block.set(0).links[0].prob.is_zero());

        block.set_spin(0, 1, -0.2);

        let (prob, inv_prob) = {
            let link = &block.set(0).links[0];
            (link.prob, link.inv_prob)
        };
        block.recalculate_probabilities(0);
        let link = &block.set(0).links[0];
        assert!((prob.ln() - link.prob.ln()).abs() < 1e-9);
        assert!((inv_prob.ln() - link.inv_prob.ln()).abs() < 1e-9);
        assert!(!prob.is_zero());
    }

    #[test]
    fn zero_multiplier_gates_interaction_off() {
        let mut block = two_linked_sets(vec![0.3, -0.7], vec![-0.4, 0.5]);
        block.recalculate_probabilities(0);
        let field = block.interaction_mean_field(0, 0, BigFloat::ZERO);
        assert!(field.is_zero());
    }

    #[test]
    fn interaction_field_skips_degenerate_links() {
        let mut block = two_linked_sets(vec![0.3, -0.7], vec![1.0, 0.5]);
        block.recalculate_probabilities(0);
        // Linked spin at index 0 has magnitude 1: that link contributes
        // nothing at that index but still counts elsewhere.
        let field = block.interaction_mean_field(0, 0, BigFloat::from(1.0));
        assert!(field.is_zero());
        let other = block.interaction_mean_field(0, 1, BigFloat::from(1.0));
        assert!(!other.is_zero());
    }

    #[test]
    fn mean_field_matches_hand_computation() {
        let lattice = Lattice::from_rows(2, vec![0.0, 1.0, 0.0, 0.0]).unwrap();
        let block = Block::new(vec![vec![0.5f64, -0.25]], &[LinkSpec::None]).unwrap();
        // Spin 0 sees J(1,0) * x_1 = 1 * -0.25.
        let mf = block.mean_field(&lattice, 0, 0, BigFloat::ZERO);
        assert!((mf.to_f64() + 0.25).abs() < 1e-12);
    }
}
