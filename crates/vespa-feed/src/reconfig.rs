//! Reconfiguration bit-set (spec §4.2).
//!
//! Comparing two config snapshots' per-key content hashes yields a
//! `ReconfigParams` bit-set; each sub-DB applies only the parts that
//! affect it rather than rebuilding wholesale on every generation bump.

use vespa_types::{ConfigName, ConfigSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconfigParams {
    pub schema_changed: bool,
    pub rank_profiles_changed: bool,
    pub attributes_changed: bool,
    pub summary_changed: bool,
    pub imports_changed: bool,
}

impl ReconfigParams {
    pub fn none_changed() -> Self {
        Self::default()
    }

    pub fn any_changed(self) -> bool {
        self.schema_changed
            || self.rank_profiles_changed
            || self.attributes_changed
            || self.summary_changed
            || self.imports_changed
    }

    /// Diffs `old` against `new`, comparing per-`ConfigName` content hashes
    /// rather than full byte equality so identical bytes under a
    /// different key ordering still compare equal.
    pub fn diff(old: &ConfigSnapshot, new: &ConfigSnapshot) -> Self {
        let changed = |name: ConfigName| -> bool {
            let old_bytes: Vec<&[u8]> = old
                .keys()
                .filter(|k| k.name == name)
                .filter_map(|k| old.get(k))
                .collect();
            let new_bytes: Vec<&[u8]> = new
                .keys()
                .filter(|k| k.name == name)
                .filter_map(|k| new.get(k))
                .collect();
            old_bytes != new_bytes
        };

        Self {
            schema_changed: changed(ConfigName::IndexSchema),
            rank_profiles_changed: changed(ConfigName::RankProfiles),
            attributes_changed: changed(ConfigName::Attributes),
            summary_changed: changed(ConfigName::Summary) || changed(ConfigName::SummaryMap),
            imports_changed: changed(ConfigName::ImportedFields),
        }
    }
}
