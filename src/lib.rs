//! Bounded elastic task pool with an M:N scheduling model.
//!
//! A small, adjustable set of reusable workers drains one shared bounded
//! queue of fire-and-forget tasks. The pool grows on demand up to a hard
//! cap, suspends submitters when both queue and cap are exhausted, and a
//! periodic shrinker retires idle workers back toward the minimum.
//!
//! # Features
//! - Bounded queue plus worker-slot limiter as the only backpressure
//! - Elastic sizing between `min_workers` and `max_workers`
//! - Periodic throughput-driven shrink, never below the minimum
//! - Per-task fault isolation with an optional fault handler
//! - Graceful shutdown that drains queued work
//!
//! # Example
//! ```
//! use elastic_pool::{Config, PoolInner};
//!
//! # #[tokio::main(flavor = "multi_thread")]
//! # async fn main() {
//! let pool = PoolInner::with_config(Config {
//!     min_workers: 2,
//!     max_workers: 8,
//!     ..Config::default()
//! })
//! .unwrap();
//!
//! pool.submit(async {
//!     // fire-and-forget work
//! })
//! .await
//! .unwrap();
//! # pool.shutdown().await;
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod metrics;
pub mod pool;
pub mod task;

pub use config::Config;
pub use errors::{ConfigError, SubmitError};
pub use metrics::PoolMetrics;
pub use pool::{Pool, PoolInner};
pub use task::{FaultHandler, Task};
