//! Merge admission throttling (spec §4.5).
//!
//! Two policies gate how many replica-synchronizing merges may run
//! concurrently per node:
//!
//! - *Static*: fixed caps on in-flight and queued merges.
//! - *Dynamic*: an AIMD-flavored window that shrinks on negative feedback
//!   and backs off on a success plateau, admitting work up to a
//!   feedback-adjusted window size.
//!
//! An unrecognized policy name falls back to static (spec: "Invalid policy
//! names fall back to static"). Chained merges are exempt from the queue
//! limit unconditionally, under both policies.

use vespa_types::metrics::Gauge;

/// Configuration knobs for the static policy.
#[derive(Debug, Clone, Copy)]
pub struct StaticPolicyConfig {
    pub max_merges_per_node: usize,
    pub max_merge_queue_size: usize,
}

impl Default for StaticPolicyConfig {
    fn default() -> Self {
        Self {
            max_merges_per_node: 16,
            max_merge_queue_size: 100,
        }
    }
}

/// Configuration knobs for the dynamic (window-based) policy.
#[derive(Debug, Clone, Copy)]
pub struct DynamicPolicyConfig {
    pub initial_window: usize,
    pub min_window: usize,
    pub max_window: usize,
    pub window_size_decrement_factor: f64,
    pub window_size_backoff: usize,
    /// Consecutive successes without negative feedback before the window
    /// is allowed to grow again (the "plateau").
    pub success_plateau: u32,
}

impl Default for DynamicPolicyConfig {
    fn default() -> Self {
        Self {
            initial_window: 8,
            min_window: 1,
            max_window: 64,
            window_size_decrement_factor: 0.5,
            window_size_backoff: 1,
            success_plateau: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    Normal,
    /// Chained merges are exempt from the queue-size limit unconditionally
    /// (spec §4.5).
    Chained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitDecision {
    Admit,
    Queue,
    Reject,
}

/// Gates merge admission for one content node under either policy.
pub enum MergeThrottle {
    Static {
        config: StaticPolicyConfig,
        active: usize,
        queued: usize,
    },
    Dynamic {
        config: DynamicPolicyConfig,
        window: usize,
        active: usize,
        consecutive_successes: u32,
    },
}

pub struct MergeThrottleMetrics {
    pub active: Gauge,
    pub queued: Gauge,
    pub rejected: Gauge,
}

impl Default for MergeThrottleMetrics {
    fn default() -> Self {
        Self {
            active: Gauge::new("vespa_merge_throttle_active_merges", "Merges currently in flight for this node"),
            queued: Gauge::new("vespa_merge_throttle_queued_merges", "Merges waiting for admission on this node"),
            rejected: Gauge::new("vespa_merge_throttle_rejected_merges", "Merges rejected by the throttle on this node"),
        }
    }
}

impl MergeThrottle {
    /// Constructs the policy named by `policy_name`. Any name other than
    /// `"static"` or `"dynamic"` falls back to static, per spec.
    pub fn from_policy_name(policy_name: &str, static_config: StaticPolicyConfig, dynamic_config: DynamicPolicyConfig) -> Self {
        match policy_name {
            "dynamic" => MergeThrottle::Dynamic {
                window: dynamic_config.initial_window,
                config: dynamic_config,
                active: 0,
                consecutive_successes: 0,
            },
            "static" => MergeThrottle::Static {
                config: static_config,
                active: 0,
                queued: 0,
            },
            other => {
                tracing::warn!(policy = other, "unrecognized merge throttle policy, falling back to static");
                MergeThrottle::Static {
                    config: static_config,
                    active: 0,
                    queued: 0,
                }
            }
        }
    }

    fn current_cap(&self) -> usize {
        match self {
            MergeThrottle::Static { config, .. } => config.max_merges_per_node,
            MergeThrottle::Dynamic { window, .. } => *window,
        }
    }

    fn active_count(&self) -> usize {
        match self {
            MergeThrottle::Static { active, .. } => *active,
            MergeThrottle::Dynamic { active, .. } => *active,
        }
    }

    /// Attempts to admit one merge. Chained merges skip the queue-size
    /// check entirely; they may still be outright rejected if admission
    /// is not possible at all (there is no queue to exempt them into).
    pub fn try_admit(&mut self, kind: MergeKind, metrics: &MergeThrottleMetrics) -> AdmitDecision {
        let cap = self.current_cap();
        if self.active_count() < cap {
            self.inc_active();
            metrics.active.set(self.active_count() as u64);
            return AdmitDecision::Admit;
        }

        match self {
            MergeThrottle::Static { config, queued, .. } => {
                if kind == MergeKind::Chained || *queued < config.max_merge_queue_size {
                    *queued += 1;
                    metrics.queued.set(*queued as u64);
                    AdmitDecision::Queue
                } else {
                    metrics.rejected.inc();
                    AdmitDecision::Reject
                }
            }
            MergeThrottle::Dynamic { .. } => {
                // The dynamic policy has no separate queue concept of its
                // own; it expresses backpressure purely through the
                // window, so anything over the window is rejected
                // (chained merges still bypass queueing, but there is
                // nothing to queue into under this policy).
                metrics.rejected.inc();
                AdmitDecision::Reject
            }
        }
    }

    fn inc_active(&mut self) {
        match self {
            MergeThrottle::Static { active, .. } => *active += 1,
            MergeThrottle::Dynamic { active, .. } => *active += 1,
        }
    }

    /// Reports completion of an in-flight merge, with `success` indicating
    /// whether it completed without negative feedback (e.g. a timeout or a
    /// node-busy rejection from the target).
    pub fn complete(&mut self, success: bool, metrics: &MergeThrottleMetrics) {
        match self {
            MergeThrottle::Static { active, queued, .. } => {
                *active = active.saturating_sub(1);
                if *queued > 0 {
                    *queued -= 1;
                    *active += 1;
                }
                metrics.active.set(*active as u64);
                metrics.queued.set(*queued as u64);
            }
            MergeThrottle::Dynamic {
                config,
                window,
                active,
                consecutive_successes,
            } => {
                *active = active.saturating_sub(1);
                if success {
                    *consecutive_successes += 1;
                    if *consecutive_successes >= config.success_plateau {
                        *window = (*window + config.window_size_backoff).min(config.max_window);
                        *consecutive_successes = 0;
                        tracing::debug!(new_window = *window, "merge throttle window backed off upward");
                    }
                } else {
                    *consecutive_successes = 0;
                    let shrunk = (*window as f64 * config.window_size_decrement_factor) as usize;
                    *window = shrunk.max(config.min_window);
                    tracing::debug!(new_window = *window, "merge throttle window shrunk on negative feedback");
                }
                metrics.active.set(*active as u64);
            }
        }
    }

    pub fn active(&self) -> usize {
        self.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unrecognized_policy_falls_back_to_static() {
        let throttle = MergeThrottle::from_policy_name("bogus", StaticPolicyConfig::default(), DynamicPolicyConfig::default());
        assert!(matches!(throttle, MergeThrottle::Static { .. }));
    }

    #[test]
    fn static_policy_admits_up_to_cap_then_queues() {
        let metrics = MergeThrottleMetrics::default();
        let mut throttle = MergeThrottle::from_policy_name(
            "static",
            StaticPolicyConfig { max_merges_per_node: 2, max_merge_queue_size: 1 },
            DynamicPolicyConfig::default(),
        );
        assert_eq!(throttle.try_admit(MergeKind::Normal, &metrics), AdmitDecision::Admit);
        assert_eq!(throttle.try_admit(MergeKind::Normal, &metrics), AdmitDecision::Admit);
        assert_eq!(throttle.try_admit(MergeKind::Normal, &metrics), AdmitDecision::Queue);
        // Queue is now full; a further normal merge is rejected...
        assert_eq!(throttle.try_admit(MergeKind::Normal, &metrics), AdmitDecision::Reject);
        // ...but a chained merge is exempt from the queue limit.
        assert_eq!(throttle.try_admit(MergeKind::Chained, &metrics), AdmitDecision::Queue);
    }

    #[test]
    fn merge_throttling_invariant_active_never_exceeds_cap() {
        let metrics = MergeThrottleMetrics::default();
        let mut throttle = MergeThrottle::from_policy_name(
            "static",
            StaticPolicyConfig { max_merges_per_node: 3, max_merge_queue_size: 10 },
            DynamicPolicyConfig::default(),
        );
        for _ in 0..10 {
            throttle.try_admit(MergeKind::Normal, &metrics);
        }
        assert!(throttle.active() <= 3);
    }

    #[test]
    fn dynamic_policy_shrinks_window_on_negative_feedback() {
        let metrics = MergeThrottleMetrics::default();
        let mut throttle = MergeThrottle::from_policy_name(
            "dynamic",
            StaticPolicyConfig::default(),
            DynamicPolicyConfig { initial_window: 8, window_size_decrement_factor: 0.5, min_window: 1, ..DynamicPolicyConfig::default() },
        );
        throttle.try_admit(MergeKind::Normal, &metrics);
        throttle.complete(false, &metrics);
        if let MergeThrottle::Dynamic { window, .. } = throttle {
            assert_eq!(window, 4);
        } else {
            panic!("expected dynamic policy");
        }
    }

    #[test]
    fn dynamic_policy_backs_off_upward_after_success_plateau() {
        let metrics = MergeThrottleMetrics::default();
        let mut throttle = MergeThrottle::from_policy_name(
            "dynamic",
            StaticPolicyConfig::default(),
            DynamicPolicyConfig { initial_window: 4, success_plateau: 2, window_size_backoff: 1, ..DynamicPolicyConfig::default() },
        );
        for _ in 0..2 {
            throttle.try_admit(MergeKind::Normal, &metrics);
            throttle.complete(true, &metrics);
        }
        if let MergeThrottle::Dynamic { window, .. } = throttle {
            assert_eq!(window, 5);
        } else {
            panic!("expected dynamic policy");
        }
    }

    proptest! {
        /// Testable property 7 (spec §8): under the static policy, active
        /// merges never exceed `max_merges_per_node` no matter how
        /// admission attempts and completions interleave.
        #[test]
        fn merge_throttling_invariant_active_bounded(
            admits in prop::collection::vec(any::<bool>(), 0..200),
            max_active in 1usize..8,
        ) {
            let metrics = MergeThrottleMetrics::default();
            let mut throttle = MergeThrottle::from_policy_name(
                "static",
                StaticPolicyConfig { max_merges_per_node: max_active, max_merge_queue_size: 1000 },
                DynamicPolicyConfig::default(),
            );

            for is_admit_attempt in admits {
                if is_admit_attempt {
                    throttle.try_admit(MergeKind::Normal, &metrics);
                } else {
                    throttle.complete(true, &metrics);
                }
                prop_assert!(throttle.active() <= max_active);
            }
        }

        /// Non-exempt (non-chained) queued merges never exceed
        /// `max_merge_queue_size`, with the active cap held low enough that
        /// admission attempts actually spill into the queue.
        #[test]
        fn merge_throttling_invariant_queue_bounded(
            num_attempts in 0usize..200,
            max_queue in 0usize..8,
        ) {
            let metrics = MergeThrottleMetrics::default();
            let mut throttle = MergeThrottle::from_policy_name(
                "static",
                StaticPolicyConfig { max_merges_per_node: 1, max_merge_queue_size: max_queue },
                DynamicPolicyConfig::default(),
            );

            for _ in 0..num_attempts {
                throttle.try_admit(MergeKind::Normal, &metrics);
                if let MergeThrottle::Static { queued, .. } = &throttle {
                    prop_assert!(*queued <= max_queue);
                }
            }
        }
    }
}
