/// Racy, eventually-consistent snapshot of the pool counters.
///
/// Each counter is independently atomic; there is no cross-counter
/// transaction, so a snapshot is not a consistent point-in-time view
/// relative to concurrent submissions.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Tasks currently sitting in the queue.
    pub queued_tasks: usize,
    /// Currently-alive workers.
    pub workers: usize,
    /// Tasks that ran to completion without faulting.
    pub completed_tasks: usize,
    /// Tasks that panicked and retired their worker.
    pub faulted_tasks: usize,
}

impl PoolMetrics {
    /// Fraction of finished tasks that completed without faulting.
    pub fn success_rate(&self) -> f64 {
        let finished = self.completed_tasks + self.faulted_tasks;
        if finished == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / finished as f64
    }
}
