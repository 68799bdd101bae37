//! Worker pool dispatching copy tasks
//!
//! A fixed number of tokio workers pull [`CopyRequest`]s from one shared,
//! bounded queue. Each worker owns its own [`CopyTask`] (and with it its own
//! handle to the backend) and pushes exactly one [`CopyOutcome`] per request
//! into the outcome channel, which is the only shared sink.
//!
//! Failures never stop the pool: a failed or even panicking copy becomes a
//! `Failed` outcome and the worker moves on to the next request.

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::{MAX_CONCURRENCY, MAX_QUEUE_DEPTH, derived_queue_depth};
use crate::model::{CopyOutcome, CopyRequest};
use crate::task::{CopyTask, TaskOptions};
use crate::traits::{CopyObserver, ObjectStore};

/// Spawns workers that execute copy tasks
#[derive(Clone)]
pub struct WorkerPool {
    store: Arc<dyn ObjectStore>,
    task_options: TaskOptions,
    observer: Arc<dyn CopyObserver>,
}

impl WorkerPool {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        task_options: TaskOptions,
        observer: Arc<dyn CopyObserver>,
    ) -> Self {
        Self {
            store,
            task_options,
            observer,
        }
    }

    /// Start `concurrency` workers behind a queue holding `queue_depth` requests
    ///
    /// Values are clamped to `1..=MAX_CONCURRENCY` and `1..=MAX_QUEUE_DEPTH`.
    pub fn start(&self, concurrency: usize, queue_depth: usize) -> PoolHandle {
        let concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        let queue_depth = queue_depth.clamp(1, MAX_QUEUE_DEPTH);
        let (queue_tx, queue_rx) = async_channel::bounded(queue_depth);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let mut workers = JoinSet::new();
        for worker_id in 0..concurrency {
            let task = CopyTask::new(
                Arc::clone(&self.store),
                self.task_options.clone(),
                Arc::clone(&self.observer),
            );
            workers.spawn(worker(worker_id, task, queue_rx.clone(), outcome_tx.clone()));
        }
        tracing::debug!(concurrency, queue_depth, "Worker pool started");

        PoolHandle {
            queue: queue_tx,
            workers,
            outcomes: outcome_rx,
            rejected: Vec::new(),
            submitted: 0,
        }
    }

    /// Copy every request with `concurrency` workers and return all outcomes
    ///
    /// Outcomes come back in completion order, not input order.
    pub async fn run<I>(&self, requests: I, concurrency: usize) -> Vec<CopyOutcome>
    where
        I: IntoIterator<Item = CopyRequest>,
    {
        let mut handle = self.start(concurrency, derived_queue_depth(concurrency));
        for req in requests {
            handle.submit(req).await;
        }
        handle.finish().await
    }
}

/// A running pool accepting requests
pub struct PoolHandle {
    queue: Sender<CopyRequest>,
    workers: JoinSet<()>,
    outcomes: mpsc::UnboundedReceiver<CopyOutcome>,
    rejected: Vec<CopyOutcome>,
    submitted: usize,
}

impl PoolHandle {
    /// Enqueue a request, waiting while the queue is full
    pub async fn submit(&mut self, req: CopyRequest) {
        self.submitted += 1;
        if let Err(async_channel::SendError(req)) = self.queue.send(req).await {
            tracing::error!(key = %req.key, "Worker pool is no longer accepting requests");
            self.rejected
                .push(CopyOutcome::failed(req.key, "worker pool shut down before copy"));
        }
    }

    /// Number of requests submitted so far
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Close the queue, wait for every worker, and return all outcomes
    pub async fn finish(self) -> Vec<CopyOutcome> {
        let PoolHandle {
            queue,
            mut workers,
            mut outcomes,
            rejected,
            submitted,
        } = self;
        drop(queue);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker terminated abnormally");
            }
        }

        let mut collected = rejected;
        collected.reserve(submitted.saturating_sub(collected.len()));
        while let Some(outcome) = outcomes.recv().await {
            collected.push(outcome);
        }
        tracing::debug!(submitted, completed = collected.len(), "Worker pool drained");
        collected
    }
}

async fn worker(
    worker_id: usize,
    task: CopyTask,
    queue: Receiver<CopyRequest>,
    outcomes: mpsc::UnboundedSender<CopyOutcome>,
) {
    let mut processed = 0usize;

    while let Ok(req) = queue.recv().await {
        let outcome = task.execute(req).await;
        processed += 1;

        if outcomes.send(outcome).is_err() {
            break;
        }
    }

    tracing::trace!(worker_id, processed, "Worker finished");
}
