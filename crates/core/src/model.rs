//! Values flowing through a copy run
//!
//! listing -> [`ObjectRecord`] -> [`CopyRequest`] -> [`CopyOutcome`] -> [`RunSummary`]

use jiff::Timestamp;
use serde::Serialize;

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Object key, path-like and possibly containing "/"
    pub key: String,
    pub last_modified: Timestamp,
}

impl ObjectRecord {
    pub fn new(key: impl Into<String>, last_modified: Timestamp) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }
}

/// A single copy to perform; the key is identical on both sides
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CopyRequest {
    pub source_bucket: String,
    pub dest_bucket: String,
    pub key: String,
}

impl CopyRequest {
    pub fn new(
        source_bucket: impl Into<String>,
        dest_bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            dest_bucket: dest_bucket.into(),
            key: key.into(),
        }
    }

    /// Line printed once the copy succeeded
    pub fn progress_line(&self) -> String {
        format!(
            "Copied {} from {} to {}",
            self.key, self.source_bucket, self.dest_bucket
        )
    }

    /// Build the request for a listed object
    pub fn for_record(record: &ObjectRecord, source_bucket: &str, dest_bucket: &str) -> Self {
        Self::new(source_bucket, dest_bucket, record.key.clone())
    }
}

impl std::fmt::Display for CopyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} -> {}", self.source_bucket, self.key, self.dest_bucket)
    }
}

/// Terminal state of one examined object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Copied,
    Skipped,
    Failed,
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyStatus::Copied => write!(f, "copied"),
            CopyStatus::Skipped => write!(f, "skipped"),
            CopyStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of examining one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOutcome {
    pub key: String,
    pub status: CopyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CopyOutcome {
    pub fn copied(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: CopyStatus::Copied,
            error: None,
        }
    }

    pub fn skipped(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: CopyStatus::Skipped,
            error: None,
        }
    }

    pub fn failed(key: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            key: key.into(),
            status: CopyStatus::Failed,
            error: Some(error.to_string()),
        }
    }
}

/// A failed key with its reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCopy {
    pub key: String,
    pub error: String,
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<FailedCopy>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the totals
    pub fn record(&mut self, outcome: CopyOutcome) {
        match outcome.status {
            CopyStatus::Copied => self.copied += 1,
            CopyStatus::Skipped => self.skipped += 1,
            CopyStatus::Failed => {
                self.failed += 1;
                self.failures.push(FailedCopy {
                    key: outcome.key,
                    error: outcome.error.unwrap_or_else(|| "unknown error".to_string()),
                });
            }
        }
    }

    /// Number of objects examined
    pub fn total(&self) -> usize {
        self.copied + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl Extend<CopyOutcome> for RunSummary {
    fn extend<T: IntoIterator<Item = CopyOutcome>>(&mut self, iter: T) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}

impl FromIterator<CopyOutcome> for RunSummary {
    fn from_iter<T: IntoIterator<Item = CopyOutcome>>(iter: T) -> Self {
        let mut summary = RunSummary::new();
        summary.extend(iter);
        summary
    }
}
