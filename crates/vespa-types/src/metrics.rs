//! A minimal metrics facade shared by every `vespa-*` crate.
//!
//! Metric *export* (an HTTP scrape endpoint) is out of scope for the
//! serving-path core (spec §1), but the ambient counters/gauges that feed
//! such an endpoint are not: spec §2 budgets 6% of the system for
//! "Metrics, tracing, wiring glue (specified only at interface)". This
//! module wraps `prometheus`'s own atomic-backed `IntCounter`/`IntGauge`
//! rather than reimplementing them on `std::sync::atomic`, without pulling
//! in the registry/export machinery that only a real server process needs.

use prometheus::{IntCounter, IntGauge};

/// A monotonically increasing counter, e.g. `feed_operations_accepted_total`.
#[derive(Debug)]
pub struct Counter(IntCounter);

impl Counter {
    /// # Panics
    ///
    /// Panics if `name` is not a valid Prometheus metric name; callers pass
    /// string literals, so this is a programming error, not a runtime one.
    pub fn new(name: &str, help: &str) -> Self {
        Self(IntCounter::new(name, help).expect("metric name/help must be valid"))
    }

    pub fn inc(&self) {
        self.0.inc();
    }

    pub fn inc_by(&self, delta: u64) {
        self.0.inc_by(delta);
    }

    pub fn get(&self) -> u64 {
        self.0.get() as u64
    }
}

/// A point-in-time value that can go up or down, e.g.
/// `merge_throttle_active_merges`.
#[derive(Debug)]
pub struct Gauge(IntGauge);

impl Gauge {
    /// # Panics
    ///
    /// Panics if `name` is not a valid Prometheus metric name; callers pass
    /// string literals, so this is a programming error, not a runtime one.
    pub fn new(name: &str, help: &str) -> Self {
        Self(IntGauge::new(name, help).expect("metric name/help must be valid"))
    }

    pub fn set(&self, value: u64) {
        self.0.set(value as i64);
    }

    pub fn add(&self, delta: i64) {
        self.0.add(delta);
    }

    pub fn get(&self) -> u64 {
        self.0.get() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_accumulates() {
        let c = Counter::new("test_counter_accumulates", "test counter");
        c.inc();
        c.inc_by(4);
        assert_eq!(c.get(), 5);
    }

    #[test]
    fn gauge_moves_both_ways() {
        let g = Gauge::new("test_gauge_moves_both_ways", "test gauge");
        g.set(10);
        g.add(-3);
        g.add(1);
        assert_eq!(g.get(), 8);
    }
}
