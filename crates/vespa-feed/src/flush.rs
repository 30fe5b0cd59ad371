//! Flush target publication (spec §4.2).
//!
//! Each sub-DB publishes targets (attribute flush, index fusion,
//! document-meta-store flush); the caller picks one by `priority * cost`
//! using the reported oldest/newest flushed serial to estimate how much
//! log a flush would let the caller trim.

use vespa_types::SerialNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushTarget {
    pub name: String,
    pub priority: u32,
    pub cost_bytes: u64,
    pub oldest_flushed_serial: SerialNumber,
    pub newest_flushed_serial: SerialNumber,
}

impl FlushTarget {
    /// Higher score flushes first. `priority * cost` directly, per spec
    /// §4.2 ("The caller chooses a target by priority × cost").
    pub fn score(&self) -> u128 {
        u128::from(self.priority) * u128::from(self.cost_bytes)
    }

    /// Picks the highest-scoring target, or `None` if `targets` is empty.
    /// Ties break on the lowest `oldest_flushed_serial` so the caller
    /// makes progress trimming the oldest part of the log first.
    pub fn choose(targets: &[FlushTarget]) -> Option<&FlushTarget> {
        targets.iter().max_by(|a, b| {
            a.score()
                .cmp(&b.score())
                .then_with(|| b.oldest_flushed_serial.cmp(&a.oldest_flushed_serial))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str, priority: u32, cost: u64, oldest: u64) -> FlushTarget {
        FlushTarget {
            name: name.to_string(),
            priority,
            cost_bytes: cost,
            oldest_flushed_serial: SerialNumber::new(oldest),
            newest_flushed_serial: SerialNumber::new(oldest + 100),
        }
    }

    #[test]
    fn highest_priority_times_cost_wins() {
        let targets = vec![target("attr", 1, 10, 0), target("index-fusion", 5, 100, 0)];
        assert_eq!(FlushTarget::choose(&targets).unwrap().name, "index-fusion");
    }

    #[test]
    fn ties_prefer_oldest_serial() {
        let targets = vec![target("a", 2, 5, 50), target("b", 1, 10, 0)];
        assert_eq!(FlushTarget::choose(&targets).unwrap().name, "b");
    }

    #[test]
    fn empty_targets_choose_none() {
        assert!(FlushTarget::choose(&[]).is_none());
    }
}
