use validator::{Validate, ValidationError};

use crate::bigfloat::BigFloat;
use crate::engine::EngineConfig;

fn validate_schedule(cfg: &ScheduleConfig) -> Result<(), ValidationError> {
    if cfg.temperature_step <= 0.0 {
        return Err(ValidationError::new("temperature_step must be positive"));
    }
    if cfg.run_count < 1 {
        return Err(ValidationError::new("run_count must be >= 1"));
    }
    if cfg.concurrency < 1 {
        return Err(ValidationError::new("concurrency must be >= 1"));
    }
    if cfg.temperature_threshold < 0.0 {
        return Err(ValidationError::new(
            "temperature_threshold must be non-negative",
        ));
    }
    Ok(())
}

/// Parameters for a batch of independent annealing runs.
///
/// Run `i` starts at `start_temperature + (i / run_count) * (final - start)`,
/// spreading start temperatures evenly across the batch.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub struct ScheduleConfig {
    pub start_temperature: f64,
    pub final_temperature: f64,
    pub temperature_step: f64,
    /// Coupling cutoff handed to each engine; see [`EngineConfig`].
    pub temperature_threshold: f64,
    pub interaction_multiplier: BigFloat,
    /// Independent annealing instances to launch.
    pub run_count: usize,
    /// Upper bound on simultaneously sweeping engines. Surplus runs queue.
    pub concurrency: usize,
    /// Per-temperature sweep cap; `None` matches the historical unbounded
    /// behavior.
    pub sweep_cap: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            start_temperature: 10.0,
            final_temperature: 10.0,
            temperature_step: 0.01,
            temperature_threshold: 0.0,
            interaction_multiplier: BigFloat::ZERO,
            run_count: 1,
            concurrency: 1,
            sweep_cap: None,
        }
    }
}

impl ScheduleConfig {
    /// Start temperature for one run of the batch.
    pub fn run_start_temperature(&self, run_index: usize) -> f64 {
        self.start_temperature
            + (run_index as f64 / self.run_count as f64)
                * (self.final_temperature - self.start_temperature)
    }

    /// Engine parameters for one run of the batch.
    pub fn engine_config(&self, run_index: usize) -> EngineConfig {
        EngineConfig {
            start_temperature: self.run_start_temperature(run_index),
            temperature_step: self.temperature_step,
            temperature_threshold: self.temperature_threshold,
            interaction_multiplier: self.interaction_multiplier,
            sweep_cap: self.sweep_cap,
        }
    }
}
