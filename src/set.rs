use num_traits::Float;

use crate::bigfloat::BigFloat;
use crate::lattice::Lattice;

/// Coupling role of a set, derived once from its link specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetType {
    /// No links: the set's mean field has no inter-set term.
    Independent,
    /// Linked to at least one other set.
    Dependent,
    /// Frozen: its Hamiltonian is reported but its spins are never updated.
    NoAnneal,
}

/// Resolved link specification for one set, as produced by an external
/// link-file parser. Duplicate targets are ignored at block construction;
/// self-links and out-of-range targets are rejected.
#[derive(Debug, Clone)]
pub enum LinkSpec {
    /// Set interacts with no others.
    None,
    /// Set interacts with every other set in the block.
    All,
    /// Set is excluded from annealing entirely.
    NoAnneal,
    /// Explicit list of target set indices.
    Targets(Vec<usize>),
}

/// A directed link to another set in the same block, with the incrementally
/// maintained equality probability `P = prod (1 + x_i y_i)/2` and inequality
/// probability `P_bar = prod (1 - x_i y_i)/2` for that pairing.
///
/// Targets are arena indices into the owning [`crate::block::Block`]'s set
/// vector; links never reference sets outside their block.
#[derive(Debug, Clone)]
pub(crate) struct Link {
    pub(crate) target: usize,
    pub(crate) prob: BigFloat,
    pub(crate) inv_prob: BigFloat,
}

/// One replica of N spin values plus its coupling role and link caches.
///
/// Spin values are conventionally in [-1, 1] after an update (`tanh` output,
/// or the hard ±1 decision at zero temperature). The set owns its value
/// storage exclusively; all cross-set reads go through the owning block.
pub struct Set<T> {
    pub(crate) values: Vec<T>,
    pub(crate) links: Vec<Link>,
    set_type: SetType,
}

/// Lossy read of a spin value for probability arithmetic.
#[inline]
pub(crate) fn scalar<T: Float>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

impl<T: Float> Set<T> {
    pub(crate) fn new(values: Vec<T>, set_type: SetType, targets: Vec<usize>) -> Self {
        let links = targets
            .into_iter()
            .map(|target| Link {
                target,
                prob: BigFloat::from(1.0),
                inv_prob: BigFloat::from(1.0),
            })
            .collect();
        Set {
            values,
            links,
            set_type,
        }
    }

    #[inline]
    pub fn spin(&self, index: usize) -> T {
        self.values[index]
    }

    #[inline]
    pub fn spins(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn set_type(&self) -> SetType {
        self.set_type
    }

    /// Indices of the sets this one links to, in link order.
    pub fn link_targets(&self) -> impl Iterator<Item = usize> + '_ {
        self.links.iter().map(|link| link.target)
    }

    /// Energy of this configuration under the lattice:
    /// `sum_i J(i,i) x_i + sum_{i<j} J(i,j) x_i x_j`.
    ///
    /// Reporting only; the sweep never evaluates it. The lattice must have
    /// the same size as this set.
    pub fn hamiltonian(&self, lattice: &Lattice<T>) -> T {
        let mut ham = T::zero();
        for i in 0..self.values.len() {
            ham = ham + lattice.at(i, i) * self.values[i];
            for j in (i + 1)..self.values.len() {
                ham = ham + lattice.at(i, j) * self.values[i] * self.values[j];
            }
        }
        ham
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamiltonian_includes_self_and_pair_terms() {
        // J(0,0)=2 self-term, J(0,1)=1 pair term.
        let lattice = Lattice::from_rows(2, vec![2.0f64, 1.0, 0.0, 0.0]).unwrap();
        let set = Set::new(vec![0.5, -0.5], SetType::Independent, vec![]);
        // 2*0.5 + 1*0.5*(-0.5) = 1 - 0.25
        assert!((set.hamiltonian(&lattice) - 0.75).abs() < 1e-12);
    }
}
