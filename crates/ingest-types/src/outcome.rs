//! Per-record outcomes and batch statistics.
//!
//! Stages report outcomes as values; callers aggregate them explicitly. A
//! skipped record is not an error: it is a validation decision, logged with
//! its reason and never retried.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of canonicalizing one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// No prior canonical record existed
    Created,
    /// Prior canonical record replaced
    Updated,
    /// Validation failed or record ineligible; reason recorded, not an error
    Skipped(String),
    /// Unexpected failure during transformation
    Failed(String),
}

impl TransformOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        TransformOutcome::Skipped(reason.into())
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        TransformOutcome::Failed(error.to_string())
    }
}

/// Outcome of one image-materialization or embedding-indexing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Work completed (or nothing was needed)
    Success,
    /// Decision procedure determined no work is required
    Skipped,
    /// Transient failure after exhausting retries; will be reattempted next scan
    Error,
    /// Permanent failure; record flagged and hidden from future scans
    PermanentFailure,
}

/// Counts reported by each batch-control invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub success: usize,
    pub errors: usize,
    pub permanent_failures: usize,
    /// Records examined by this batch
    pub total: usize,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transform outcome.
    pub fn record_transform(&mut self, outcome: &TransformOutcome) {
        self.total += 1;
        match outcome {
            TransformOutcome::Created => self.created += 1,
            TransformOutcome::Updated => self.updated += 1,
            TransformOutcome::Skipped(_) => self.skipped += 1,
            TransformOutcome::Failed(_) => self.errors += 1,
        }
    }

    /// Record a processing outcome.
    pub fn record_process(&mut self, outcome: ProcessOutcome) {
        self.total += 1;
        match outcome {
            ProcessOutcome::Success => self.success += 1,
            ProcessOutcome::Skipped => self.skipped += 1,
            ProcessOutcome::Error => self.errors += 1,
            ProcessOutcome::PermanentFailure => self.permanent_failures += 1,
        }
    }

    /// Merge another batch's counts into this one.
    pub fn merge(&mut self, other: &BatchStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.success += other.success;
        self.errors += other.errors;
        self.permanent_failures += other.permanent_failures;
        self.total += other.total;
    }

    /// Whether this batch examined any records at all.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Records that resulted in actual work (not skips).
    pub fn processed(&self) -> usize {
        self.created + self.updated + self.success
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} skipped={} success={} errors={} permanent_failures={} total={}",
            self.created,
            self.updated,
            self.skipped,
            self.success,
            self.errors,
            self.permanent_failures,
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_transform_counts() {
        let mut stats = BatchStats::new();
        stats.record_transform(&TransformOutcome::Created);
        stats.record_transform(&TransformOutcome::Updated);
        stats.record_transform(&TransformOutcome::skipped("no thumbnail"));
        stats.record_transform(&TransformOutcome::failed("boom"));

        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.processed(), 2);
    }

    #[test]
    fn test_record_process_counts() {
        let mut stats = BatchStats::new();
        stats.record_process(ProcessOutcome::Success);
        stats.record_process(ProcessOutcome::PermanentFailure);
        stats.record_process(ProcessOutcome::Skipped);

        assert_eq!(stats.success, 1);
        assert_eq!(stats.permanent_failures, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.total, 3);
    }

    #[test]
    fn test_merge() {
        let mut a = BatchStats::new();
        a.record_process(ProcessOutcome::Success);
        let mut b = BatchStats::new();
        b.record_process(ProcessOutcome::Error);
        b.record_process(ProcessOutcome::Success);

        a.merge(&b);
        assert_eq!(a.success, 2);
        assert_eq!(a.errors, 1);
        assert_eq!(a.total, 3);
    }

    #[test]
    fn test_is_empty() {
        assert!(BatchStats::new().is_empty());
    }
}
