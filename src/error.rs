use thiserror::Error;

/// Construction-time failures in the interaction data model.
///
/// These all originate in malformed input from the caller (lattice sizes,
/// spin rows, link specifications) and are raised before any annealing
/// starts; the solver itself never produces them mid-run.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("lattice size {lattice} does not match set spin count {set}")]
    LatticeMismatch { lattice: usize, set: usize },

    #[error("set {set_index} has {actual} spins, expected {expected}")]
    RaggedBlock {
        set_index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("block must contain at least one set")]
    EmptyBlock,

    #[error("set {set_index} links to itself")]
    SelfLink { set_index: usize },

    #[error("set {set_index} links to {target}, but the block has {set_count} sets")]
    LinkOutOfRange {
        set_index: usize,
        target: usize,
        set_count: usize,
    },

    #[error("temperature step must be positive, got {0}")]
    NonPositiveStep(f64),
}

/// Failures surfaced by the run scheduler.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid schedule config: {0}")]
    Config(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
