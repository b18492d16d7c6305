use thiserror::Error;

/// Rejected pool configuration.
///
/// Raised by construction before any queue, worker, or shrinker exists;
/// an invalid configuration never yields a partially built pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue_capacity must be at least 1")]
    ZeroQueueCapacity,
    #[error("min_workers must be at least 1")]
    ZeroMinWorkers,
    #[error("min_workers ({min}) exceeds max_workers ({max})")]
    MinAboveMax { min: usize, max: usize },
    #[error("shrink_period must be non-zero")]
    ZeroShrinkPeriod,
    #[error("shrink_threshold must be at least 1")]
    ZeroShrinkThreshold,
}

/// Rejected task submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The pool has been shut down and no longer accepts work.
    #[error("pool is shut down")]
    PoolClosed,
}
