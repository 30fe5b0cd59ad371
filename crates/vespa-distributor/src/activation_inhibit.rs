//! Activation inhibit (spec §4.5).
//!
//! If the cluster has global-document merges pending and
//! `inhibitDefaultMergesWhenGlobalMergesPending` is set, default-bucket-
//! space merges are deferred until the global space has converged.
//! `maxActivationInhibitedOutOfSyncGroups` bounds how many groups may be
//! held out of activation at once, so a persistently lagging global space
//! cannot stall the whole cluster's default-space activation forever.

use std::collections::HashSet;

use vespa_types::BucketId;

#[derive(Debug, Clone, Copy)]
pub struct ActivationInhibitConfig {
    pub inhibit_default_merges_when_global_merges_pending: bool,
    pub max_activation_inhibited_out_of_sync_groups: usize,
}

impl Default for ActivationInhibitConfig {
    fn default() -> Self {
        Self {
            inhibit_default_merges_when_global_merges_pending: true,
            max_activation_inhibited_out_of_sync_groups: 1,
        }
    }
}

/// Tracks which distribution groups currently have a default-space merge
/// held back because the global bucket space has not converged.
pub struct ActivationInhibitor {
    config: ActivationInhibitConfig,
    inhibited_groups: HashSet<u32>,
}

impl ActivationInhibitor {
    pub fn new(config: ActivationInhibitConfig) -> Self {
        Self {
            config,
            inhibited_groups: HashSet::new(),
        }
    }

    /// Decides whether a default-space merge for `group` may proceed,
    /// given the set of global buckets that have not yet converged.
    /// Returns `true` if inhibited (the merge must wait).
    pub fn should_inhibit(&mut self, group: u32, pending_global_buckets: impl ExactSizeIterator<Item = BucketId>) -> bool {
        if !self.config.inhibit_default_merges_when_global_merges_pending {
            return false;
        }
        if pending_global_buckets.len() == 0 {
            self.inhibited_groups.remove(&group);
            return false;
        }

        if self.inhibited_groups.contains(&group) {
            return true;
        }

        if self.inhibited_groups.len() < self.config.max_activation_inhibited_out_of_sync_groups {
            self.inhibited_groups.insert(group);
            tracing::debug!(group, "inhibiting default-space merges pending global convergence");
            true
        } else {
            // Already at the cap of held-out groups: let this one proceed
            // rather than stalling the cluster indefinitely.
            tracing::warn!(
                group,
                cap = self.config.max_activation_inhibited_out_of_sync_groups,
                "activation inhibit cap reached, allowing default-space merge despite pending global merges"
            );
            false
        }
    }

    pub fn release(&mut self, group: u32) {
        self.inhibited_groups.remove(&group);
    }

    pub fn inhibited_count(&self) -> usize {
        self.inhibited_groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use vespa_types::DocumentId;

    fn bucket(key: &str) -> BucketId {
        let doc = DocumentId::from_str(&format!("id:ns:type::{key}")).unwrap();
        BucketId::for_document(&doc, 16)
    }

    #[test]
    fn no_pending_global_buckets_never_inhibits() {
        let mut inhibitor = ActivationInhibitor::new(ActivationInhibitConfig::default());
        assert!(!inhibitor.should_inhibit(0, std::iter::empty()));
    }

    #[test]
    fn inhibits_up_to_cap_then_allows_through() {
        let mut inhibitor = ActivationInhibitor::new(ActivationInhibitConfig {
            inhibit_default_merges_when_global_merges_pending: true,
            max_activation_inhibited_out_of_sync_groups: 1,
        });
        let pending = vec![bucket("a")];
        assert!(inhibitor.should_inhibit(0, pending.clone().into_iter()));
        assert_eq!(inhibitor.inhibited_count(), 1);
        // Second group exceeds the cap: allowed through rather than stalling.
        assert!(!inhibitor.should_inhibit(1, pending.into_iter()));
    }

    #[test]
    fn disabled_config_never_inhibits() {
        let mut inhibitor = ActivationInhibitor::new(ActivationInhibitConfig {
            inhibit_default_merges_when_global_merges_pending: false,
            max_activation_inhibited_out_of_sync_groups: 5,
        });
        assert!(!inhibitor.should_inhibit(0, vec![bucket("a")].into_iter()));
    }

    #[test]
    fn convergence_releases_the_group() {
        let mut inhibitor = ActivationInhibitor::new(ActivationInhibitConfig::default());
        inhibitor.should_inhibit(0, vec![bucket("a")].into_iter());
        assert_eq!(inhibitor.inhibited_count(), 1);
        assert!(!inhibitor.should_inhibit(0, std::iter::empty()));
        assert_eq!(inhibitor.inhibited_count(), 0);
    }
}
