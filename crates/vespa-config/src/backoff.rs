//! Config agent back-off policy (spec §4.1).
//!
//! On success the delay resets to `success_delay`. On a transport/server
//! error the delay grows linearly with `unconfigured_delay` per
//! consecutive failure, saturating at `max_delay_multiplier *
//! unconfigured_delay`. On a well-formed but semantically invalid
//! response the delay instead grows with `configured_error_delay`, with
//! the same saturation cap. Any success resets the counter.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    success_delay: Duration,
    unconfigured_delay: Duration,
    configured_error_delay: Duration,
    max_delay_multiplier: u32,
    consecutive_failures: u32,
}

/// What kind of response the agent just observed, driving which delay
/// grows (spec §4.1's three-way distinction between success, transport
/// error, and semantically invalid-but-well-formed response).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Success,
    ServerError,
    SemanticallyInvalid,
}

impl BackoffPolicy {
    pub fn new(
        success_delay: Duration,
        unconfigured_delay: Duration,
        configured_error_delay: Duration,
        max_delay_multiplier: u32,
    ) -> Self {
        Self {
            success_delay,
            unconfigured_delay,
            configured_error_delay,
            max_delay_multiplier,
            consecutive_failures: 0,
        }
    }

    /// Vespa's documented production defaults: 5s on success, 1s linear
    /// step on transport failure, 20s linear step on semantic error,
    /// capped at 10x the step.
    pub fn default_policy() -> Self {
        Self::new(
            Duration::from_secs(5),
            Duration::from_secs(1),
            Duration::from_secs(20),
            10,
        )
    }

    /// Folds one poll outcome in and returns the delay to wait before the
    /// next poll.
    pub fn record(&mut self, outcome: PollOutcome) -> Duration {
        match outcome {
            PollOutcome::Success => {
                self.consecutive_failures = 0;
                self.success_delay
            }
            PollOutcome::ServerError => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let delay = saturating_linear(
                    self.unconfigured_delay,
                    self.consecutive_failures,
                    self.max_delay_multiplier,
                );
                tracing::warn!(
                    consecutive_failures = self.consecutive_failures,
                    delay_ms = delay.as_millis() as u64,
                    "config poll transport failure, backing off"
                );
                delay
            }
            PollOutcome::SemanticallyInvalid => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let delay = saturating_linear(
                    self.configured_error_delay,
                    self.consecutive_failures,
                    self.max_delay_multiplier,
                );
                tracing::warn!(
                    consecutive_failures = self.consecutive_failures,
                    delay_ms = delay.as_millis() as u64,
                    "config poll returned semantically invalid response, backing off"
                );
                delay
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

fn saturating_linear(step: Duration, failures: u32, max_multiplier: u32) -> Duration {
    let multiplier = failures.min(max_multiplier);
    step * multiplier.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resets_delay_and_counter() {
        let mut policy = BackoffPolicy::new(
            Duration::from_secs(5),
            Duration::from_secs(1),
            Duration::from_secs(20),
            10,
        );
        policy.record(PollOutcome::ServerError);
        policy.record(PollOutcome::ServerError);
        assert_eq!(policy.record(PollOutcome::Success), Duration::from_secs(5));
        assert_eq!(policy.consecutive_failures(), 0);
    }

    #[test]
    fn server_error_grows_linearly_then_saturates() {
        let mut policy = BackoffPolicy::new(
            Duration::from_secs(5),
            Duration::from_secs(1),
            Duration::from_secs(20),
            3,
        );
        assert_eq!(policy.record(PollOutcome::ServerError), Duration::from_secs(1));
        assert_eq!(policy.record(PollOutcome::ServerError), Duration::from_secs(2));
        assert_eq!(policy.record(PollOutcome::ServerError), Duration::from_secs(3));
        assert_eq!(policy.record(PollOutcome::ServerError), Duration::from_secs(3));
    }

    #[test]
    fn semantic_error_uses_its_own_step() {
        let mut policy = BackoffPolicy::new(
            Duration::from_secs(5),
            Duration::from_secs(1),
            Duration::from_secs(20),
            10,
        );
        assert_eq!(
            policy.record(PollOutcome::SemanticallyInvalid),
            Duration::from_secs(20)
        );
    }
}
