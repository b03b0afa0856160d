use std::sync::Arc;

use num_traits::Float;
use rayon::prelude::*;
use tracing::debug;
use validator::Validate;

use crate::block::BlockSource;
use crate::config::ScheduleConfig;
use crate::engine::AnnealingEngine;
use crate::error::ScheduleError;
use crate::lattice::Lattice;
use crate::report::{ReportSink, RunReport, SetReport};
use crate::set::scalar;

/// Launches independent annealing runs against one shared lattice.
///
/// Each run owns its block exclusively and executes on a worker thread of a
/// dedicated pool sized to the concurrency limit, so at most that many
/// engines sweep simultaneously while any number of runs may be queued.
/// `run` blocks until every run has completed.
pub struct RunScheduler<T> {
    lattice: Arc<Lattice<T>>,
    config: ScheduleConfig,
}

impl<T: Float + Send + Sync> RunScheduler<T> {
    /// Validates the config up front; a bad schedule never launches.
    pub fn new(lattice: Arc<Lattice<T>>, config: ScheduleConfig) -> Result<Self, ScheduleError> {
        config.validate()?;
        Ok(RunScheduler { lattice, config })
    }

    #[inline]
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice<T> {
        self.lattice.as_ref()
    }

    /// Anneal every run of the batch, emitting each terminal state to the
    /// sink as it completes, and return all reports in run order.
    ///
    /// Sink emission order between runs is unspecified; the returned vector
    /// is always indexed by run.
    pub fn run<B, S>(&self, template: &B, sink: &S) -> Result<Vec<RunReport>, ScheduleError>
    where
        B: BlockSource<T>,
        S: ReportSink,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency)
            .build()?;
        pool.install(|| {
            (0..self.config.run_count)
                .into_par_iter()
                .map(|run_index| self.execute_run(run_index, template, sink))
                .collect()
        })
    }

    fn execute_run<B, S>(
        &self,
        run_index: usize,
        template: &B,
        sink: &S,
    ) -> Result<RunReport, ScheduleError>
    where
        B: BlockSource<T>,
        S: ReportSink,
    {
        let block = template.instance(run_index)?;
        let engine_config = self.config.engine_config(run_index);
        let start_temperature = engine_config.start_temperature;
        let mut engine = AnnealingEngine::new(self.lattice.as_ref(), block, engine_config)?;

        let initial: Vec<Vec<f64>> = engine
            .block()
            .sets()
            .iter()
            .map(|set| set.spins().iter().map(|&v| scalar(v)).collect())
            .collect();
        sink.run_started(run_index, start_temperature, &initial);

        let status = engine.anneal();

        let sets = engine
            .block()
            .sets()
            .iter()
            .map(|set| SetReport {
                set_type: set.set_type(),
                hamiltonian: scalar(set.hamiltonian(self.lattice.as_ref())),
            })
            .collect();
        let spins = engine
            .block()
            .sets()
            .iter()
            .map(|set| set.spins().iter().copied().map(scalar).collect())
            .collect();
        let report = RunReport {
            run_index,
            start_temperature,
            sets,
            spins,
            steps: engine.step_count(),
            status,
        };
        debug!(
            run_index,
            start_temperature,
            steps = report.steps,
            "annealing run finished"
        );
        sink.run_finished(&report);
        Ok(report)
    }
}
