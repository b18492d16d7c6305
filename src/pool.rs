use std::{
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use crossbeam::queue::ArrayQueue;
use futures::FutureExt;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::Config,
    errors::{ConfigError, SubmitError},
    metrics::PoolMetrics,
    task::{Task, WorkItem},
};

/// Shared-ownership handle to a pool.
///
/// All clones point at the same queue and worker-slot limiter; the pool
/// itself cannot be duplicated, only referenced.
pub type Pool = Arc<PoolInner>;

/// Bounded elastic task pool.
///
/// A fixed-capacity FIFO queue feeds a set of reusable workers. Submission
/// prefers the queue, spawns a fresh worker while the cap allows, and
/// otherwise suspends the submitter until either opens up. A background
/// shrinker retires workers above the minimum whenever a period passes with
/// too few completions.
pub struct PoolInner {
    config: Config,
    queue: ArrayQueue<WorkItem>,
    /// One permit per live worker, capacity `max_workers`.
    worker_slots: Arc<Semaphore>,
    /// Signalled after every enqueue; workers park here when the queue is empty.
    item_ready: Notify,
    /// Signalled after every dequeue; submitters and the shrinker park here
    /// when the queue is full.
    space_ready: Notify,
    queue_len: AtomicUsize,
    worker_count: AtomicUsize,
    /// Tasks dequeued since the last shrink check; reset every period.
    completed_in_period: AtomicUsize,
    completed_total: AtomicUsize,
    faulted_total: AtomicUsize,
    closed: AtomicBool,
    shutdown_token: CancellationToken,
}

/// Held by a worker for its whole life. Dropping it releases the slot and
/// decrements the worker count, on every exit path, normal or faulted.
struct WorkerSlot<'a> {
    pool: &'a PoolInner,
    _permit: OwnedSemaphorePermit,
}

impl Drop for WorkerSlot<'_> {
    fn drop(&mut self) {
        self.pool.worker_count.fetch_sub(1, Ordering::Relaxed);
    }
}

impl PoolInner {
    /// Builds a pool with the default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Pool, ConfigError> {
        Self::with_config(Config::default())
    }

    /// Validates `config`, pre-spawns `min_workers` workers, and starts the
    /// shrinker. The pre-spawned workers hold their slots before this
    /// returns.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_config(config: Config) -> Result<Pool, ConfigError> {
        config.validate()?;
        let pool = Arc::new(PoolInner {
            queue: ArrayQueue::new(config.queue_capacity),
            worker_slots: Arc::new(Semaphore::new(config.max_workers)),
            item_ready: Notify::new(),
            space_ready: Notify::new(),
            queue_len: AtomicUsize::new(0),
            worker_count: AtomicUsize::new(0),
            completed_in_period: AtomicUsize::new(0),
            completed_total: AtomicUsize::new(0),
            faulted_total: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            shutdown_token: CancellationToken::new(),
            config,
        });

        for _ in 0..pool.config.min_workers {
            let permit = pool
                .worker_slots
                .clone()
                .try_acquire_owned()
                .expect("fresh limiter holds at least min_workers permits");
            pool.spawn_worker(permit, None);
        }

        let shrinker = pool.clone();
        tokio::spawn(async move { shrinker.shrink_loop().await });

        Ok(pool)
    }

    /// Submits a unit of work.
    ///
    /// The task is either enqueued immediately or handed to a freshly
    /// spawned worker; when the queue is full and the worker cap is reached,
    /// the submitter suspends until one of the two opens. This suspension is
    /// the pool's only backpressure mechanism.
    pub async fn submit<F>(self: &Arc<Self>, future: F) -> Result<(), SubmitError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit_boxed(Box::pin(future)).await
    }

    /// [`submit`](Self::submit) for an already-boxed task.
    pub async fn submit_boxed(self: &Arc<Self>, task: Task) -> Result<(), SubmitError> {
        let mut task = task;
        loop {
            if self.closed.load(Ordering::Relaxed) {
                return Err(SubmitError::PoolClosed);
            }

            // Register for space before probing so a dequeue between the
            // failed push and the wait below cannot be missed.
            let space = self.space_ready.notified();

            match self.queue.push(WorkItem::Run(task)) {
                Ok(()) => {
                    self.queue_len.fetch_add(1, Ordering::Relaxed);
                    self.item_ready.notify_one();
                    return Ok(());
                }
                Err(WorkItem::Run(rejected)) => task = rejected,
                Err(WorkItem::Stop) => unreachable!("submission only pushes Run items"),
            }

            if let Ok(permit) = self.worker_slots.clone().try_acquire_owned() {
                self.spawn_worker(permit, Some(task));
                return Ok(());
            }

            // Queue full and cap reached: wait for whichever opens first.
            // select! polls in random order, so neither side is favored.
            tokio::select! {
                _ = space => {}
                permit = self.worker_slots.clone().acquire_owned() => {
                    let permit = permit.expect("worker-slot limiter is never closed");
                    self.spawn_worker(permit, Some(task));
                    return Ok(());
                }
            }
        }
    }

    /// Remaining queue capacity. Racy snapshot.
    pub fn free_queue_capacity(&self) -> usize {
        self.config
            .queue_capacity
            .saturating_sub(self.queue_len.load(Ordering::Relaxed))
    }

    /// Currently-alive workers. Racy snapshot.
    pub fn worker_count(&self) -> usize {
        self.worker_count.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            queued_tasks: self.queue_len.load(Ordering::Relaxed),
            workers: self.worker_count.load(Ordering::Relaxed),
            completed_tasks: self.completed_total.load(Ordering::Relaxed),
            faulted_tasks: self.faulted_total.load(Ordering::Relaxed),
        }
    }

    /// Rejects further submissions, stops the shrinker, and returns once
    /// every worker has drained the queued work and retired.
    ///
    /// Idempotent. Tasks already queued still run to completion; a submitter
    /// suspended in [`submit`](Self::submit) when this is called may still
    /// slip its task in, and that task runs before the worker taking it
    /// retires.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::Relaxed) {
            return;
        }
        self.shutdown_token.cancel();
        debug!("shutting down pool");
        // Feed stop signals until the last worker is gone. Pushing can
        // overshoot; leftover stop signals in a closed pool are inert.
        loop {
            if self.worker_count.load(Ordering::Relaxed) == 0 {
                return;
            }
            let space = self.space_ready.notified();
            if self.queue.push(WorkItem::Stop).is_ok() {
                self.item_ready.notify_one();
                continue;
            }
            tokio::select! {
                _ = space => {}
                // The last retirement can slip past the space signal; poll
                // the worker count rather than waiting on it forever.
                _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => {}
            }
        }
    }

    fn spawn_worker(self: &Arc<Self>, permit: OwnedSemaphorePermit, first: Option<Task>) {
        // Counted before the task runs so the cap invariant holds from the
        // moment the permit is taken.
        self.worker_count.fetch_add(1, Ordering::Relaxed);
        let pool = self.clone();
        tokio::spawn(async move { pool.worker_loop(permit, first).await });
    }

    async fn worker_loop(&self, permit: OwnedSemaphorePermit, first: Option<Task>) {
        let _slot = WorkerSlot {
            pool: self,
            _permit: permit,
        };

        // A worker spawned by submission runs its first task directly,
        // bypassing the queue.
        if let Some(task) = first {
            if self.run_task(task).await.is_err() {
                return;
            }
        }

        loop {
            match self.next_item().await {
                WorkItem::Run(task) => {
                    if self.run_task(task).await.is_err() {
                        return;
                    }
                }
                WorkItem::Stop => {
                    debug!("worker retiring on stop signal");
                    return;
                }
            }
        }
    }

    /// Fault boundary around one task invocation. `Err` means the task
    /// panicked and this worker must retire.
    async fn run_task(&self, task: Task) -> Result<(), ()> {
        match AssertUnwindSafe(task).catch_unwind().await {
            Ok(()) => {
                self.completed_total.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(payload) => {
                self.faulted_total.fetch_add(1, Ordering::Relaxed);
                warn!("task panicked; retiring its worker");
                if let Some(handler) = &self.config.fault_handler {
                    handler(payload);
                }
                Err(())
            }
        }
    }

    /// Suspends until the queue yields an item. Length and shrink-period
    /// accounting for real tasks happens here, at the dequeue point.
    async fn next_item(&self) -> WorkItem {
        loop {
            // Register before probing so an enqueue between the empty pop
            // and the wait below cannot be missed.
            let ready = self.item_ready.notified();
            if let Some(item) = self.queue.pop() {
                if matches!(item, WorkItem::Run(_)) {
                    self.queue_len.fetch_sub(1, Ordering::Relaxed);
                    self.completed_in_period.fetch_add(1, Ordering::Relaxed);
                }
                self.space_ready.notify_one();
                return item;
            }
            // Empty and closed means the pool is draining down; retire
            // rather than park forever.
            if self.closed.load(Ordering::Relaxed) {
                return WorkItem::Stop;
            }
            ready.await;
        }
    }

    async fn shrink_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.shrink_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; swallow that so the first real check
        // happens one full period in.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.shrink_check().await,
                _ = self.shutdown_token.cancelled() => return,
            }
        }
    }

    /// One shrink cycle: if the finished period saw fewer completions than
    /// the threshold, inject one stop signal per worker above the minimum.
    async fn shrink_check(&self) {
        let completed = self.completed_in_period.swap(0, Ordering::Relaxed);
        if completed >= self.config.shrink_threshold {
            return;
        }
        let workers = self.worker_count.load(Ordering::Relaxed);
        let excess = workers.saturating_sub(self.config.min_workers);
        if excess == 0 {
            return;
        }
        debug!(completed, workers, excess, "low throughput; injecting stop signals");
        for _ in 0..excess {
            self.push_stop().await;
        }
    }

    /// Enqueues one stop signal, suspending while the queue is full. Stop
    /// signals compete with real tasks for queue slots and FIFO position, so
    /// a backlog of queued work delays their effect.
    async fn push_stop(&self) {
        let mut item = WorkItem::Stop;
        loop {
            let space = self.space_ready.notified();
            match self.queue.push(item) {
                Ok(()) => {
                    self.item_ready.notify_one();
                    return;
                }
                Err(rejected) => item = rejected,
            }
            tokio::select! {
                _ = space => {}
                // Shutdown drains the queue on its own; abandon the insert.
                _ = self.shutdown_token.cancelled() => return,
            }
        }
    }
}
