//! Copy task: the unit of work executed by a pool worker

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{RetryConfig, RunConfig};
use crate::error::{Error, Result};
use crate::model::{CopyOutcome, CopyRequest};
use crate::retry::{is_retryable_error, retry_with_backoff};
use crate::traits::{CopyObserver, ObjectStore};

/// Per-copy execution policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOptions {
    /// Deadline for a single backend copy call
    pub timeout: Option<Duration>,
    pub retry: RetryConfig,
}

impl From<&RunConfig> for TaskOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            timeout: config.task_timeout,
            retry: config.retry.clone(),
        }
    }
}

/// Copies one object and turns the backend result into a [`CopyOutcome`]
///
/// Never deletes the source object.
#[derive(Clone)]
pub struct CopyTask {
    store: Arc<dyn ObjectStore>,
    options: TaskOptions,
    observer: Arc<dyn CopyObserver>,
}

impl CopyTask {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        options: TaskOptions,
        observer: Arc<dyn CopyObserver>,
    ) -> Self {
        Self {
            store,
            options,
            observer,
        }
    }

    /// Run the copy. Errors are captured in the outcome, never returned.
    ///
    /// The backend call runs in its own tokio task, so a panic there becomes
    /// a `Failed` outcome. A panicking observer never changes the outcome.
    pub async fn execute(&self, req: CopyRequest) -> CopyOutcome {
        let task = self.clone();
        let attempt = req.clone();
        let result = tokio::spawn(async move { task.copy_with_retry(&attempt).await })
            .await
            .unwrap_or_else(|e| Err(Error::General(format!("copy task aborted: {e}"))));

        match result {
            Ok(()) => {
                tracing::debug!(key = %req.key, "Copied object");
                self.notify(&req, |observer| observer.on_copied(&req));
                CopyOutcome::copied(req.key)
            }
            Err(e) => {
                tracing::warn!(key = %req.key, error = %e, "Copy failed");
                self.notify(&req, |observer| observer.on_failed(&req, &e));
                CopyOutcome::failed(req.key, e)
            }
        }
    }

    fn notify(&self, req: &CopyRequest, event: impl FnOnce(&dyn CopyObserver)) {
        let observer = self.observer.as_ref();
        if panic::catch_unwind(AssertUnwindSafe(|| event(observer))).is_err() {
            tracing::error!(key = %req.key, "Progress observer panicked");
        }
    }

    async fn copy_with_retry(&self, req: &CopyRequest) -> Result<()> {
        retry_with_backoff(
            &self.options.retry,
            || self.copy_once(req),
            is_retryable_error,
        )
        .await
    }

    async fn copy_once(&self, req: &CopyRequest) -> Result<()> {
        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.store.copy_object(req))
                .await
                .map_err(|_| {
                    Error::Timeout(format!(
                        "copy of '{}' did not finish within {}ms",
                        req.key,
                        limit.as_millis()
                    ))
                })?,
            None => self.store.copy_object(req).await,
        }
    }
}
