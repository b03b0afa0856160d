use num_traits::Float;
use tracing::warn;

use crate::bigfloat::BigFloat;
use crate::block::Block;
use crate::error::ModelError;
use crate::lattice::Lattice;
use crate::set::{scalar, SetType};

/// Spin change below which a full sweep counts as stable.
pub const CONVERGENCE_THRESHOLD: f64 = 0.001;

/// Terminal state of an anneal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnealStatus {
    /// Every temperature step converged within the sweep cap.
    Converged,
    /// At least one temperature step exhausted the sweep cap before its
    /// sweeps stabilized; the schedule still ran to completion.
    IterationCapReached,
}

/// Per-engine annealing parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub start_temperature: f64,
    pub temperature_step: f64,
    /// Below this temperature the inter-set coupling term is dropped from
    /// the mean field. A performance cutoff, not a physical discontinuity:
    /// the multiplier is typically tiny, so at high temperature the term is
    /// noise next to the thermal scale.
    pub temperature_threshold: f64,
    pub interaction_multiplier: BigFloat,
    /// Max sweeps per temperature step. `None` preserves the historical
    /// unbounded behavior, which loops forever on pathological inputs.
    pub sweep_cap: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            start_temperature: 10.0,
            temperature_step: 1.0,
            temperature_threshold: 0.0,
            interaction_multiplier: BigFloat::ZERO,
            sweep_cap: None,
        }
    }
}

/// One annealing instance: a private block relaxed against a shared
/// read-only lattice over a decreasing temperature schedule.
pub struct AnnealingEngine<'a, T> {
    lattice: &'a Lattice<T>,
    block: Block<T>,
    temperature: f64,
    temperature_step: f64,
    temperature_threshold: f64,
    interaction_multiplier: BigFloat,
    sweep_cap: Option<u64>,
    step_counter: u64,
}

impl<'a, T: Float> AnnealingEngine<'a, T> {
    /// Fails fast if the block's spin count does not match the lattice, or
    /// the temperature step is not positive.
    pub fn new(
        lattice: &'a Lattice<T>,
        block: Block<T>,
        config: EngineConfig,
    ) -> Result<Self, ModelError> {
        if lattice.size() != block.set_size() {
            return Err(ModelError::LatticeMismatch {
                lattice: lattice.size(),
                set: block.set_size(),
            });
        }
        if config.temperature_step <= 0.0 {
            return Err(ModelError::NonPositiveStep(config.temperature_step));
        }
        Ok(AnnealingEngine {
            lattice,
            block,
            temperature: config.start_temperature,
            temperature_step: config.temperature_step,
            temperature_threshold: config.temperature_threshold,
            interaction_multiplier: config.interaction_multiplier,
            sweep_cap: config.sweep_cap,
            step_counter: 0,
        })
    }

    /// One full pass over every non-frozen set and spin. Returns whether the
    /// pass left all spins within the convergence threshold.
    fn sweep(&mut self) -> bool {
        for set_index in 0..self.block.set_count() {
            self.block.recalculate_probabilities(set_index);
        }

        let multiplier = if self.temperature > self.temperature_threshold {
            self.interaction_multiplier
        } else {
            BigFloat::ZERO
        };

        let mut stable = true;
        for set_index in 0..self.block.set_count() {
            if self.block.set(set_index).set_type() == SetType::NoAnneal {
                continue;
            }
            for spin_index in 0..self.block.set_size() {
                let mean_field =
                    self.block
                        .mean_field(self.lattice, set_index, spin_index, multiplier);
                let new_value: T = if self.temperature > 0.0 {
                    (mean_field / -self.temperature).narrow::<T>().tanh()
                } else if mean_field > BigFloat::ZERO {
                    // Hard sign decision at zero temperature; ties land on +1.
                    -T::one()
                } else {
                    T::one()
                };
                let old_value = self.block.set(set_index).spin(spin_index);
                if (scalar(new_value) - scalar(old_value)).abs() > CONVERGENCE_THRESHOLD {
                    stable = false;
                }
                self.block.set_spin(set_index, spin_index, new_value);
            }
        }
        self.step_counter += 1;
        stable
    }

    /// Sweep at the current temperature until convergence or the cap.
    fn annealing_step(&mut self) -> AnnealStatus {
        let mut sweeps = 0u64;
        loop {
            let stable = self.sweep();
            sweeps += 1;
            if stable {
                return AnnealStatus::Converged;
            }
            if let Some(cap) = self.sweep_cap {
                if sweeps >= cap {
                    warn!(
                        temperature = self.temperature,
                        sweeps, "sweep cap reached before convergence"
                    );
                    return AnnealStatus::IterationCapReached;
                }
            }
        }
    }

    /// Run the full temperature schedule, blocking until done.
    ///
    /// The temperature is lowered before each step, so the final pass runs
    /// at a temperature at or below zero and hard-decides every spin to ±1.
    pub fn anneal(&mut self) -> AnnealStatus {
        let mut status = AnnealStatus::Converged;
        loop {
            self.temperature -= self.temperature_step;
            if self.annealing_step() == AnnealStatus::IterationCapReached {
                status = AnnealStatus::IterationCapReached;
            }
            if self.temperature <= 0.0 {
                break;
            }
        }
        status
    }

    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Total sweeps performed so far, across all temperature steps.
    #[inline]
    pub fn step_count(&self) -> u64 {
        self.step_counter
    }

    #[inline]
    pub fn block(&self) -> &Block<T> {
        &self.block
    }

    pub fn into_block(self) -> Block<T> {
        self.block
    }

    /// Terminal Hamiltonian of one set under the shared lattice.
    pub fn hamiltonian(&self, set_index: usize) -> T {
        self.block.set(set_index).hamiltonian(self.lattice)
    }
}
