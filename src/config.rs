use std::{fmt, time::Duration};

use crate::errors::ConfigError;
use crate::task::FaultHandler;

/// Pool tunables. Immutable once a pool is built from them.
///
/// Construct with struct-update syntax over [`Config::default`]:
///
/// ```
/// use elastic_pool::Config;
///
/// let cfg = Config {
///     min_workers: 4,
///     max_workers: 32,
///     ..Config::default()
/// };
/// assert_eq!(cfg.queue_capacity, 128);
/// ```
#[derive(Clone)]
pub struct Config {
    /// Capacity of the pending-task queue.
    pub queue_capacity: usize,
    /// Workers pre-spawned at construction and kept alive through shrink cycles.
    pub min_workers: usize,
    /// Hard cap on concurrently-alive workers.
    pub max_workers: usize,
    /// Completions per shrink period below which idle workers are retired.
    pub shrink_threshold: usize,
    /// Interval between shrink checks.
    pub shrink_period: Duration,
    /// Invoked with the panic payload when a task faults. `None` drops faults.
    pub fault_handler: Option<FaultHandler>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_capacity: 128,
            min_workers: 8,
            max_workers: 256,
            shrink_threshold: 1024,
            shrink_period: Duration::from_secs(60),
            fault_handler: None,
        }
    }
}

impl Config {
    /// Sizing for CPU-bound tasks: min one worker per core, cap at 4x cores.
    pub fn cpu_bound() -> Self {
        let cores = num_cpus::get();
        Self {
            min_workers: cores,
            max_workers: cores * 4,
            ..Default::default()
        }
    }

    /// Sizing for I/O-bound tasks: workers spend most of their time suspended,
    /// so the cap is well above the core count.
    pub fn io_bound() -> Self {
        let cores = num_cpus::get();
        Self {
            min_workers: cores * 2,
            max_workers: cores * 8,
            ..Default::default()
        }
    }

    /// Replaces every zero numeric field with its default instead of failing
    /// validation. `min_workers > max_workers` is left as-is and still fails
    /// at construction.
    ///
    /// This mirrors option layers that silently ignore out-of-range values;
    /// prefer letting construction fail fast.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.queue_capacity == 0 {
            self.queue_capacity = defaults.queue_capacity;
        }
        if self.min_workers == 0 {
            self.min_workers = defaults.min_workers;
        }
        if self.max_workers == 0 {
            self.max_workers = defaults.max_workers;
        }
        if self.shrink_threshold == 0 {
            self.shrink_threshold = defaults.shrink_threshold;
        }
        if self.shrink_period.is_zero() {
            self.shrink_period = defaults.shrink_period;
        }
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        // A zero-worker pool could enqueue work that nothing ever drains.
        if self.min_workers == 0 {
            return Err(ConfigError::ZeroMinWorkers);
        }
        if self.min_workers > self.max_workers {
            return Err(ConfigError::MinAboveMax {
                min: self.min_workers,
                max: self.max_workers,
            });
        }
        if self.shrink_period.is_zero() {
            return Err(ConfigError::ZeroShrinkPeriod);
        }
        if self.shrink_threshold == 0 {
            return Err(ConfigError::ZeroShrinkThreshold);
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("queue_capacity", &self.queue_capacity)
            .field("min_workers", &self.min_workers)
            .field("max_workers", &self.max_workers)
            .field("shrink_threshold", &self.shrink_threshold)
            .field("shrink_period", &self.shrink_period)
            .field("fault_handler", &self.fault_handler.is_some())
            .finish()
    }
}
