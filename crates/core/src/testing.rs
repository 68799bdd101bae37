//! In-memory backend and observer used by the engine's tests

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};

use crate::error::{Error, Result};
use crate::model::{CopyRequest, ObjectRecord};
use crate::traits::{CopyObserver, ListPage, ObjectStore};

/// Object store holding one source listing and recording copied keys
#[derive(Default)]
pub struct FakeStore {
    objects: Vec<ObjectRecord>,
    page_size: usize,
    throttled: HashSet<String>,
    panics: HashSet<String>,
    listing_error_at_page: Option<usize>,
    delay: Option<Duration>,
    copied: Mutex<BTreeMap<String, BTreeSet<String>>>,
    copy_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeStore {
    pub fn new(objects: Vec<ObjectRecord>) -> Self {
        Self {
            objects,
            page_size: 1000,
            ..Default::default()
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Copies of `key` fail with a throttling error
    pub fn throttle(mut self, key: &str) -> Self {
        self.throttled.insert(key.to_string());
        self
    }

    /// Copies of `key` panic inside the backend
    pub fn panic_on(mut self, key: &str) -> Self {
        self.panics.insert(key.to_string());
        self
    }

    /// Listing page `page` (zero based) fails
    pub fn fail_listing_at(mut self, page: usize) -> Self {
        self.listing_error_at_page = Some(page);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Keys present in `bucket` after copying
    pub fn keys_in(&self, bucket: &str) -> BTreeSet<String> {
        self.copied
            .lock()
            .unwrap()
            .get(bucket)
            .cloned()
            .unwrap_or_default()
    }

    pub fn copy_calls(&self) -> usize {
        self.copy_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn list_page(
        &self,
        _bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        let page: usize = match continuation_token {
            Some(token) => token
                .parse()
                .map_err(|_| Error::General(format!("bad token {token}")))?,
            None => 0,
        };
        if self.listing_error_at_page == Some(page) {
            return Err(Error::Auth("AccessDenied".to_string()));
        }

        let start = page * self.page_size;
        let end = (start + self.page_size).min(self.objects.len());
        let objects = self.objects.get(start..end).unwrap_or_default().to_vec();
        let continuation_token = (end < self.objects.len()).then(|| (page + 1).to_string());

        Ok(ListPage {
            objects,
            continuation_token,
        })
    }

    async fn copy_object(&self, req: &CopyRequest) -> Result<()> {
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panics.contains(&req.key) {
            panic!("backend exploded on {}", req.key);
        }
        if self.throttled.contains(&req.key) {
            return Err(Error::Throttled("SlowDown: reduce your request rate".to_string()));
        }
        if !self.objects.iter().any(|o| o.key == req.key) {
            return Err(Error::NotFound(req.key.clone()));
        }

        self.copied
            .lock()
            .unwrap()
            .entry(req.dest_bucket.clone())
            .or_default()
            .insert(req.key.clone());
        Ok(())
    }
}

/// Observer that remembers every event it receives
#[derive(Default)]
pub struct RecordingObserver {
    pub copied: Mutex<Vec<String>>,
    pub failed: Mutex<HashMap<String, String>>,
}

impl CopyObserver for RecordingObserver {
    fn on_copied(&self, req: &CopyRequest) {
        self.copied.lock().unwrap().push(req.progress_line());
    }

    fn on_failed(&self, req: &CopyRequest, error: &Error) {
        self.failed
            .lock()
            .unwrap()
            .insert(req.key.clone(), error.to_string());
    }
}

/// Observer whose callbacks panic, as printing to a closed stdout does
pub struct PanickingObserver;

impl CopyObserver for PanickingObserver {
    fn on_copied(&self, _req: &CopyRequest) {
        panic!("failed printing to stdout: Broken pipe (os error 32)");
    }

    fn on_failed(&self, _req: &CopyRequest, _error: &Error) {
        panic!("failed printing to stderr: Broken pipe (os error 32)");
    }
}

/// Object last modified `days` before `now`
pub fn aged(key: &str, now: Timestamp, days: i64) -> ObjectRecord {
    let last_modified = now
        .checked_sub(SignedDuration::from_hours(days * 24))
        .unwrap();
    ObjectRecord::new(key, last_modified)
}
