//! Retention window filtering

use jiff::{SignedDuration, Timestamp};

use crate::error::{Error, Result};
use crate::model::ObjectRecord;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whether an object modified at `last_modified` falls inside the window.
///
/// The bound is inclusive: an object stamped exactly at `cutoff` is copied.
pub fn should_copy(last_modified: Timestamp, cutoff: Timestamp) -> bool {
    last_modified >= cutoff
}

/// Oldest timestamp still eligible for copy, `now - retention_days`
pub fn cutoff(now: Timestamp, retention_days: i64) -> Result<Timestamp> {
    if retention_days < 0 {
        return Err(Error::Config(format!(
            "Retention must be zero or more days, got {retention_days}"
        )));
    }

    let window = retention_days
        .checked_mul(SECONDS_PER_DAY)
        .map(SignedDuration::from_secs)
        .ok_or_else(|| Error::Config(format!("Retention of {retention_days} days is too large")))?;

    now.checked_sub(window).map_err(|e| {
        Error::Config(format!(
            "Retention of {retention_days} days is out of range: {e}"
        ))
    })
}

/// Retention predicate with the cutoff fixed for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionFilter {
    cutoff: Timestamp,
}

impl RetentionFilter {
    pub fn new(cutoff: Timestamp) -> Self {
        Self { cutoff }
    }

    /// Compute the cutoff once from `now` and hold it
    pub fn from_now(now: Timestamp, retention_days: i64) -> Result<Self> {
        Ok(Self::new(cutoff(now, retention_days)?))
    }

    pub fn cutoff(&self) -> Timestamp {
        self.cutoff
    }

    pub fn accepts(&self, record: &ObjectRecord) -> bool {
        should_copy(record.last_modified, self.cutoff)
    }
}
