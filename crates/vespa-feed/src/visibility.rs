//! Visibility delay (spec §4.2).
//!
//! Writes acknowledged to the feeder become searchable after at most
//! `visibility_delay`, bounded by `max_visibility_delay` from global
//! config. Acks are buffered in a FIFO queue, which trivially preserves
//! per-document ordering since it preserves the full feed order.

use std::time::Duration;

use vespa_types::{DocumentId, SerialNumber};

struct PendingVisibility {
    doc_id: DocumentId,
    serial: SerialNumber,
    visible_at_ns: u64,
}

pub struct VisibilityQueue {
    visibility_delay_ns: u64,
    pending: Vec<PendingVisibility>,
}

impl VisibilityQueue {
    /// Clamps `visibility_delay` to `max_visibility_delay`, per spec §4.2.
    pub fn new(visibility_delay: Duration, max_visibility_delay: Duration) -> Self {
        let clamped = visibility_delay.min(max_visibility_delay);
        Self {
            visibility_delay_ns: clamped.as_nanos() as u64,
            pending: Vec::new(),
        }
    }

    /// Records an acknowledged write, due to become searchable at `now_ns
    /// + visibility_delay`.
    pub fn ack(&mut self, doc_id: DocumentId, serial: SerialNumber, now_ns: u64) {
        self.pending.push(PendingVisibility {
            doc_id,
            serial,
            visible_at_ns: now_ns.saturating_add(self.visibility_delay_ns),
        });
    }

    /// Drains and returns, in feed order, every write whose delay has
    /// elapsed by `now_ns`.
    pub fn drain_due(&mut self, now_ns: u64) -> Vec<(DocumentId, SerialNumber)> {
        let split = self
            .pending
            .iter()
            .position(|p| p.visible_at_ns > now_ns)
            .unwrap_or(self.pending.len());
        self.pending
            .drain(..split)
            .map(|p| (p.doc_id, p.serial))
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
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
    fn delay_is_clamped_to_configured_maximum() {
        let queue = VisibilityQueue::new(Duration::from_secs(10), Duration::from_secs(2));
        assert_eq!(queue.visibility_delay_ns, 2_000_000_000);
    }

    #[test]
    fn drains_only_due_writes_in_feed_order() {
        let mut queue = VisibilityQueue::new(Duration::from_millis(100), Duration::from_secs(1));
        queue.ack(doc("a"), SerialNumber::new(1), 0);
        queue.ack(doc("b"), SerialNumber::new(2), 50_000_000);

        assert!(queue.drain_due(90_000_000).is_empty());
        let due = queue.drain_due(100_000_000);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, SerialNumber::new(1));
        assert_eq!(queue.pending_count(), 1);

        let due = queue.drain_due(150_000_000);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, SerialNumber::new(2));
    }
}
