//! Resource-threshold write blocking (spec §4.6).
//!
//! When smoothed disk or memory usage crosses a configured limit, feed
//! writes must be rejected with a retriable [`vespa_types::CoreError`]
//! rather than allowed to run the node out of resources.

use std::sync::Mutex;

use vespa_types::CoreError;

use crate::sampler::{ResourceSampler, ResourceUsage};

/// A callback invoked whenever the filter's blocked state changes, with the
/// new `is_blocked` value (spec §4.6: "Subscribers of the filter receive
/// change notifications"). Synchronous and called inline from `refresh`,
/// the same pure-callback-list shape the rest of this workspace uses for
/// cross-component notification instead of a channel/async runtime.
pub type ChangeSubscriber = Box<dyn Fn(bool) + Send + Sync>;

/// Which resource tripped the write block, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBlockReason {
    Disk,
    Memory,
}

impl WriteBlockReason {
    fn as_str(self) -> &'static str {
        match self {
            WriteBlockReason::Disk => "disk",
            WriteBlockReason::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WriteBlockFilterConfig {
    pub disk_limit_ratio: f64,
    pub memory_limit_ratio: f64,
    /// Usage must fall back below `limit_ratio * resume_hysteresis` before
    /// blocking is lifted, so the filter doesn't flap at the boundary.
    pub resume_hysteresis: f64,
}

impl Default for WriteBlockFilterConfig {
    fn default() -> Self {
        Self {
            disk_limit_ratio: 0.9,
            memory_limit_ratio: 0.9,
            resume_hysteresis: 0.95,
        }
    }
}

/// Gates feed writes on smoothed resource usage, with hysteresis so a
/// block, once entered, requires usage to drop meaningfully below the
/// limit (not merely to the limit) before writes resume.
pub struct WriteBlockFilter {
    config: WriteBlockFilterConfig,
    blocked: std::sync::atomic::AtomicBool,
    subscribers: Mutex<Vec<ChangeSubscriber>>,
}

impl WriteBlockFilter {
    pub fn new(config: WriteBlockFilterConfig) -> Self {
        Self {
            config,
            blocked: std::sync::atomic::AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback to be invoked on every blocked/unblocked
    /// transition (spec §4.6).
    pub fn subscribe(&self, callback: ChangeSubscriber) {
        self.subscribers.lock().unwrap().push(callback);
    }

    fn notify_subscribers(&self, blocked: bool) {
        for callback in self.subscribers.lock().unwrap().iter() {
            callback(blocked);
        }
    }

    fn reason(&self, usage: ResourceUsage) -> Option<WriteBlockReason> {
        if usage.disk_used_ratio >= self.config.disk_limit_ratio {
            Some(WriteBlockReason::Disk)
        } else if usage.memory_used_ratio >= self.config.memory_limit_ratio {
            Some(WriteBlockReason::Memory)
        } else {
            None
        }
    }

    fn resume_reason(&self, usage: ResourceUsage) -> Option<WriteBlockReason> {
        let disk_resume = self.config.disk_limit_ratio * self.config.resume_hysteresis;
        let memory_resume = self.config.memory_limit_ratio * self.config.resume_hysteresis;
        if usage.disk_used_ratio >= disk_resume {
            Some(WriteBlockReason::Disk)
        } else if usage.memory_used_ratio >= memory_resume {
            Some(WriteBlockReason::Memory)
        } else {
            None
        }
    }

    /// Re-evaluates the block state against `sampler`'s current smoothed
    /// reading. Call this on a timer, the way the teacher's repair-budget
    /// throttle is ticked alongside replication.
    pub fn refresh(&self, sampler: &ResourceSampler) {
        let usage = sampler.current();
        let currently_blocked = self.blocked.load(std::sync::atomic::Ordering::Relaxed);

        if currently_blocked {
            if self.resume_reason(usage).is_none() {
                self.blocked.store(false, std::sync::atomic::Ordering::Relaxed);
                tracing::info!("write blocking lifted, resource usage back within hysteresis band");
                self.notify_subscribers(false);
            }
        } else if let Some(reason) = self.reason(usage) {
            self.blocked.store(true, std::sync::atomic::Ordering::Relaxed);
            tracing::warn!(reason = reason.as_str(), disk = usage.disk_used_ratio, memory = usage.memory_used_ratio, "blocking writes on resource exhaustion");
            self.notify_subscribers(true);
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Checks whether a write may proceed, returning the retriable error
    /// the feed pipeline should surface to the client when blocked.
    pub fn check(&self, sampler: &ResourceSampler) -> Result<(), CoreError> {
        self.refresh(sampler);
        if self.is_blocked() {
            let usage = sampler.current();
            let (resource, used_ratio, limit_ratio) = match self.reason(usage).or(self.resume_reason(usage)) {
                Some(WriteBlockReason::Disk) | None => ("disk", usage.disk_used_ratio, self.config.disk_limit_ratio),
                Some(WriteBlockReason::Memory) => ("memory", usage.memory_used_ratio, self.config.memory_limit_ratio),
            };
            return Err(CoreError::ResourceExhausted {
                resource,
                used_ratio,
                limit_ratio,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> WriteBlockFilter {
        WriteBlockFilter::new(WriteBlockFilterConfig {
            disk_limit_ratio: 0.8,
            memory_limit_ratio: 0.8,
            resume_hysteresis: 0.9,
        })
    }

    #[test]
    fn blocks_once_disk_crosses_limit() {
        let sampler = ResourceSampler::new(1.0);
        let filter = filter();
        sampler.record(ResourceUsage {
            disk_used_ratio: 0.85,
            memory_used_ratio: 0.1,
        });
        assert!(filter.check(&sampler).is_err());
    }

    #[test]
    fn stays_blocked_until_below_hysteresis_band() {
        let sampler = ResourceSampler::new(1.0);
        let filter = filter();
        sampler.record(ResourceUsage {
            disk_used_ratio: 0.85,
            memory_used_ratio: 0.0,
        });
        filter.refresh(&sampler);
        assert!(filter.is_blocked());

        // Drops below the limit but still above the resume band (0.72).
        sampler.record(ResourceUsage {
            disk_used_ratio: 0.75,
            memory_used_ratio: 0.0,
        });
        filter.refresh(&sampler);
        assert!(filter.is_blocked(), "should not resume inside the hysteresis band");

        sampler.record(ResourceUsage {
            disk_used_ratio: 0.5,
            memory_used_ratio: 0.0,
        });
        filter.refresh(&sampler);
        assert!(!filter.is_blocked());
    }

    #[test]
    fn unblocked_writes_succeed() {
        let sampler = ResourceSampler::new(1.0);
        let filter = filter();
        sampler.record(ResourceUsage::zero());
        assert!(filter.check(&sampler).is_ok());
    }

    #[test]
    fn subscribers_are_notified_on_each_transition() {
        use std::sync::{Arc, Mutex as StdMutex};

        let sampler = ResourceSampler::new(1.0);
        let filter = filter();
        let observed = Arc::new(StdMutex::new(Vec::new()));
        let observed_clone = observed.clone();
        filter.subscribe(Box::new(move |blocked| observed_clone.lock().unwrap().push(blocked)));

        sampler.record(ResourceUsage { disk_used_ratio: 0.85, memory_used_ratio: 0.0 });
        filter.refresh(&sampler);
        sampler.record(ResourceUsage { disk_used_ratio: 0.1, memory_used_ratio: 0.0 });
        filter.refresh(&sampler);

        assert_eq!(*observed.lock().unwrap(), vec![true, false]);
    }
}
