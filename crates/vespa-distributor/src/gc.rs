//! Garbage-collection scheduling and selection evaluation (spec §4.5).
//!
//! When a schema declares a GC selection and `garbage-collection = true`,
//! the distributor periodically evaluates `not (<selection>)` per bucket
//! and removes matching documents in batches. `garbage-collection-interval
//! = 0` disables GC entirely.

use std::time::Duration;

use vespa_types::{BucketId, DocumentId};

/// A GC selection predicate: returns `true` if the document should be
/// *kept*. The distributor removes documents for which this returns
/// `false` (spec: evaluates `not (<selection>)`).
pub trait GcSelection {
    fn keep(&self, doc_id: &DocumentId) -> bool;
}

impl<F: Fn(&DocumentId) -> bool> GcSelection for F {
    fn keep(&self, doc_id: &DocumentId) -> bool {
        self(doc_id)
    }
}

/// Schedules periodic GC sweeps. `interval = Duration::ZERO` disables GC,
/// matching the spec's "Interval 0 disables GC."
#[derive(Debug, Clone, Copy)]
pub struct GcSchedule {
    interval: Duration,
    enabled: bool,
}

impl GcSchedule {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self { enabled, interval }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.interval.is_zero()
    }

    /// Whether a sweep is due, given how long it has been since the last
    /// one ran (or since startup, if it has never run).
    pub fn is_due(&self, elapsed_since_last_run: Duration) -> bool {
        self.is_enabled() && elapsed_since_last_run >= self.interval
    }
}

impl Default for GcSchedule {
    fn default() -> Self {
        Self::new(true, Self::DEFAULT_INTERVAL)
    }
}

/// Outcome of one GC sweep over a bucket's documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcSweepResult {
    pub bucket: Option<BucketId>,
    pub evaluated: usize,
    pub removed: Vec<DocumentId>,
}

/// Evaluates a GC selection over one batch of document ids belonging to a
/// bucket, returning the ones to remove. Batching (rather than a single
/// pass over the whole corpus) lets the caller interleave GC work with
/// live feed traffic instead of holding a bucket lock for the whole sweep.
pub fn sweep_batch(bucket: BucketId, doc_ids: &[DocumentId], selection: &impl GcSelection) -> GcSweepResult {
    let mut removed = Vec::new();
    for doc_id in doc_ids {
        if !selection.keep(doc_id) {
            removed.push(doc_id.clone());
        }
    }
    tracing::debug!(
        ?bucket,
        evaluated = doc_ids.len(),
        removed = removed.len(),
        "garbage collection sweep"
    );
    GcSweepResult {
        bucket: Some(bucket),
        evaluated: doc_ids.len(),
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn doc(key: &str) -> DocumentId {
        DocumentId::from_str(&format!("id:ns:type::{key}")).unwrap()
    }

    #[test]
    fn interval_zero_disables_gc() {
        let schedule = GcSchedule::new(true, Duration::ZERO);
        assert!(!schedule.is_enabled());
        assert!(!schedule.is_due(Duration::from_secs(999_999)));
    }

    #[test]
    fn due_once_interval_elapses() {
        let schedule = GcSchedule::new(true, Duration::from_secs(60));
        assert!(!schedule.is_due(Duration::from_secs(30)));
        assert!(schedule.is_due(Duration::from_secs(60)));
    }

    #[test]
    fn disabled_flag_overrides_nonzero_interval() {
        let schedule = GcSchedule::new(false, Duration::from_secs(60));
        assert!(!schedule.is_due(Duration::from_secs(600)));
    }

    #[test]
    fn sweep_removes_documents_not_matching_selection() {
        let bucket = BucketId::for_document(&doc("a"), 8);
        let docs = vec![doc("keep"), doc("drop")];
        // The selection predicate represents the schema's GC expression:
        // true = keep. Here, anything with "drop" in its key is removed.
        let selection = |d: &DocumentId| !d.to_string().contains("drop");
        let result = sweep_batch(bucket, &docs, &selection);
        assert_eq!(result.evaluated, 2);
        assert_eq!(result.removed, vec![doc("drop")]);
    }
}
