//! Run coordination: listing -> retention filter -> worker pool -> summary

use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;
use jiff::Timestamp;

use crate::config::RunConfig;
use crate::error::Result;
use crate::listing::list_objects;
use crate::model::{CopyOutcome, CopyRequest, RunSummary};
use crate::pool::WorkerPool;
use crate::retention::RetentionFilter;
use crate::task::TaskOptions;
use crate::traits::{CopyObserver, ObjectStore};

/// Drives one bucket-to-bucket copy
pub struct Coordinator {
    store: Arc<dyn ObjectStore>,
    config: RunConfig,
    observer: Arc<dyn CopyObserver>,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        config: RunConfig,
        observer: Arc<dyn CopyObserver>,
    ) -> Self {
        Self {
            store,
            config,
            observer,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run with the cutoff anchored at the current time
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Timestamp::now()).await
    }

    /// Run with the cutoff computed once from `now`
    ///
    /// Individual copy failures end up in the summary. Only an invalid
    /// configuration or a listing failure is returned as an error; in the
    /// latter case copies already queued are allowed to finish first.
    #[tracing::instrument(
        skip_all,
        fields(source = %self.config.source_bucket, dest = %self.config.dest_bucket)
    )]
    pub async fn run_at(&self, now: Timestamp) -> Result<RunSummary> {
        self.config.validate()?;
        let filter = RetentionFilter::from_now(now, self.config.retention_days)?;

        tracing::info!(
            cutoff = %filter.cutoff(),
            retention_days = self.config.retention_days,
            concurrency = self.config.concurrency,
            "Starting copy run"
        );

        let pool = WorkerPool::new(
            Arc::clone(&self.store),
            TaskOptions::from(&self.config),
            Arc::clone(&self.observer),
        );
        let mut handle = pool.start(self.config.concurrency, self.config.queue_depth);

        let mut summary = RunSummary::new();
        let mut listing_error = None;
        let mut listing = pin!(list_objects(
            Arc::clone(&self.store),
            self.config.source_bucket.clone()
        ));

        while let Some(item) = listing.next().await {
            match item {
                Ok(record) if filter.accepts(&record) => {
                    let req = CopyRequest::for_record(
                        &record,
                        &self.config.source_bucket,
                        &self.config.dest_bucket,
                    );
                    handle.submit(req).await;
                }
                Ok(record) => {
                    tracing::trace!(key = %record.key, last_modified = %record.last_modified, "Outside retention window");
                    summary.record(CopyOutcome::skipped(record.key));
                }
                Err(e) => {
                    listing_error = Some(e);
                    break;
                }
            }
        }

        summary.extend(handle.finish().await);

        if let Some(e) = listing_error {
            tracing::error!(
                copied = summary.copied,
                failed = summary.failed,
                error = %e,
                "Listing failed, run aborted"
            );
            return Err(e);
        }

        tracing::info!(
            copied = summary.copied,
            skipped = summary.skipped,
            failed = summary.failed,
            "Copy run complete"
        );
        Ok(summary)
    }
}
