//! Disk and memory usage sampling (spec §4.6).
//!
//! An EWMA smooths the raw signal over time rather than reacting to
//! single samples, so a momentary spike doesn't flip write-blocking
//! state on and off.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time disk/memory usage reading, expressed as a fraction of
/// the configured limit (`0.0` idle, `1.0` at limit, `>1.0` over limit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    pub disk_used_ratio: f64,
    pub memory_used_ratio: f64,
}

impl ResourceUsage {
    pub const fn zero() -> Self {
        Self {
            disk_used_ratio: 0.0,
            memory_used_ratio: 0.0,
        }
    }

    pub fn max_ratio(self) -> f64 {
        self.disk_used_ratio.max(self.memory_used_ratio)
    }
}

/// A source of raw, un-smoothed resource usage readings. The real content
/// node implementation queries the filesystem and process RSS; tests and
/// simulations substitute a scripted provider.
pub trait TransientUsageProvider {
    fn sample(&self) -> ResourceUsage;
}

/// A provider returning a fixed reading, for tests.
pub struct FixedUsageProvider(pub ResourceUsage);

impl TransientUsageProvider for FixedUsageProvider {
    fn sample(&self) -> ResourceUsage {
        self.0
    }
}

/// EWMA smoother over a [`TransientUsageProvider`]'s raw samples.
///
/// Stores the smoothed ratios as bit-packed `u64`s behind atomics so a
/// sampler can be read from multiple threads (the write-block filter and
/// any status/metrics endpoint both poll it) without a lock.
pub struct ResourceSampler {
    alpha: f64,
    disk_bits: AtomicU64,
    memory_bits: AtomicU64,
}

impl ResourceSampler {
    /// `alpha` is the EWMA smoothing factor in `(0.0, 1.0]`; higher values
    /// track new samples faster. The teacher's repair-budget throttle uses
    /// `0.2` as its default smoothing factor; the same default holds here
    /// since both are damping a bursty signal on a similar timescale.
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "alpha must be in (0.0, 1.0]");
        Self {
            alpha,
            disk_bits: AtomicU64::new(0f64.to_bits()),
            memory_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Folds one raw sample into the running EWMA.
    pub fn record(&self, raw: ResourceUsage) {
        let new_disk = ewma_step(self.disk_bits.load(Ordering::Relaxed), raw.disk_used_ratio, self.alpha);
        let new_memory = ewma_step(self.memory_bits.load(Ordering::Relaxed), raw.memory_used_ratio, self.alpha);
        self.disk_bits.store(new_disk, Ordering::Relaxed);
        self.memory_bits.store(new_memory, Ordering::Relaxed);
    }

    /// Samples `provider` once and folds the result in.
    pub fn tick(&self, provider: &dyn TransientUsageProvider) {
        self.record(provider.sample());
    }

    pub fn current(&self) -> ResourceUsage {
        ResourceUsage {
            disk_used_ratio: f64::from_bits(self.disk_bits.load(Ordering::Relaxed)),
            memory_used_ratio: f64::from_bits(self.memory_bits.load(Ordering::Relaxed)),
        }
    }
}

fn ewma_step(prev_bits: u64, raw: f64, alpha: f64) -> u64 {
    let prev = f64::from_bits(prev_bits);
    (alpha * raw + (1.0 - alpha) * prev).to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_does_not_jump_straight_to_raw_value() {
        let sampler = ResourceSampler::new(0.2);
        sampler.record(ResourceUsage {
            disk_used_ratio: 1.0,
            memory_used_ratio: 0.0,
        });
        let current = sampler.current();
        assert!(current.disk_used_ratio < 1.0);
        assert!((current.disk_used_ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn converges_toward_sustained_raw_value() {
        let sampler = ResourceSampler::new(0.5);
        for _ in 0..50 {
            sampler.record(ResourceUsage {
                disk_used_ratio: 0.9,
                memory_used_ratio: 0.1,
            });
        }
        let current = sampler.current();
        assert!((current.disk_used_ratio - 0.9).abs() < 1e-6);
        assert!((current.memory_used_ratio - 0.1).abs() < 1e-6);
    }

    #[test]
    fn tick_pulls_from_provider() {
        let sampler = ResourceSampler::new(1.0);
        let provider = FixedUsageProvider(ResourceUsage {
            disk_used_ratio: 0.4,
            memory_used_ratio: 0.6,
        });
        sampler.tick(&provider);
        assert_eq!(sampler.current(), provider.0);
    }
}
