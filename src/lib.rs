//! Mean-field annealing for Ising-type interaction networks.
//!
//! Many independent annealing instances share one read-only [`Lattice`];
//! each instance owns a [`Block`] of spin [`Set`]s wired together by links
//! and relaxes it to a mean-field fixed point over a decreasing temperature
//! schedule. Probability products over linked sets are kept in [`BigFloat`]
//! so they survive far below native float range.

pub mod bigfloat;
pub mod block;
pub mod config;
pub mod engine;
pub mod error;
pub mod lattice;
pub mod report;
pub mod scheduler;
pub mod set;

pub use bigfloat::BigFloat;
pub use block::{Block, BlockSource, RandomBlockTemplate};
pub use config::ScheduleConfig;
pub use engine::{AnnealStatus, AnnealingEngine, EngineConfig, CONVERGENCE_THRESHOLD};
pub use error::{ModelError, ScheduleError};
pub use lattice::Lattice;
pub use report::{ConsoleSink, MemorySink, ReportSink, RunReport, SetReport, WriterSink};
pub use scheduler::RunScheduler;
pub use set::{LinkSpec, Set, SetType};
