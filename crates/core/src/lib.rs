//! bcp-core: Copy-dispatch engine for the bcp bucket copy tool
//!
//! This crate provides everything between a bucket listing and a run
//! summary:
//! - Retention filtering against a cutoff fixed for the whole run
//! - Copy tasks with optional per-call timeout and retry
//! - A bounded worker pool executing copies concurrently
//! - The run coordinator aggregating outcomes into a summary
//!
//! The crate does not depend on any storage SDK. Backends implement
//! [`ObjectStore`]; see `bcp-s3` for the S3 implementation.

pub mod config;
pub mod error;
pub mod listing;
pub mod model;
pub mod pool;
pub mod retention;
pub mod retry;
pub mod run;
pub mod task;
pub mod traits;

#[cfg(test)]
mod testing;

pub use config::{
    Config, ConfigManager, Defaults, MAX_CONCURRENCY, MAX_QUEUE_DEPTH, RetryConfig, RunConfig,
    S3Settings,
};
pub use error::{Error, Result};
pub use listing::list_objects;
pub use model::{CopyOutcome, CopyRequest, CopyStatus, FailedCopy, ObjectRecord, RunSummary};
pub use pool::{PoolHandle, WorkerPool};
pub use retention::{RetentionFilter, cutoff, should_copy};
pub use retry::{RetryBuilder, is_retryable_error, retry_with_backoff};
pub use run::Coordinator;
pub use task::{CopyTask, TaskOptions};
pub use traits::{CopyObserver, ListPage, ObjectStore};
