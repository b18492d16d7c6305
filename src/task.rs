use std::{any::Any, future::Future, pin::Pin, sync::Arc};

/// A unit of work accepted by the pool: opaque, argument-less, result-less.
///
/// Fire-and-forget by contract; a task has no identity, no result channel,
/// and cannot be cancelled once accepted.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked with the panic payload of a faulted task.
///
/// Runs synchronously on the faulting worker just before that worker
/// retires, so it must be fast and non-blocking.
pub type FaultHandler = Arc<dyn Fn(Box<dyn Any + Send>) + Send + Sync>;

/// Item carried by the shared queue.
pub(crate) enum WorkItem {
    /// A task to execute.
    Run(Task),
    /// Retire the worker that dequeues this item.
    Stop,
}
