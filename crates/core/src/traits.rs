//! Backend and observer seams
//!
//! The engine never talks to a storage SDK directly. A backend implements
//! [`ObjectStore`] (listing plus server-side copy) and the frontend
//! implements [`CopyObserver`] to surface progress.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{CopyRequest, ObjectRecord};

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectRecord>,
    /// Token for the next page, `None` on the last page
    pub continuation_token: Option<String>,
}

/// Storage backend consumed by the copy engine
///
/// Implementations must be cheap to share between workers; each worker
/// holds its own `Arc` handle to the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of `bucket`, starting after `continuation_token`
    async fn list_page(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage>;

    /// Server-side copy of `req.key` from the source to the destination bucket
    async fn copy_object(&self, req: &CopyRequest) -> Result<()>;
}

/// Receives per-object progress from the worker pool
///
/// Called concurrently from every worker.
pub trait CopyObserver: Send + Sync {
    fn on_copied(&self, req: &CopyRequest);

    fn on_failed(&self, _req: &CopyRequest, _error: &Error) {}
}

