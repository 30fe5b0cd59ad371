use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checksum::identity_hash;

/// Monotonically increasing integer identifying a configuration or
/// component-graph generation (spec §3, Generation in the glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ConfigGeneration(u64);

impl ConfigGeneration {
    pub const ZERO: ConfigGeneration = ConfigGeneration(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ConfigGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the config names recognized by the file config manager (spec §6,
/// "Configuration on-disk layout per generation"). A closed enumeration
/// per the REDESIGN discipline in spec §9: reflection-driven binding
/// collapses to a fixed set of recognized options, unknown ones rejected
/// at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigName {
    RankProfiles,
    Attributes,
    IndexSchema,
    Summary,
    SummaryMap,
    JuniperRc,
    ImportedFields,
}

impl ConfigName {
    pub const ALL: [ConfigName; 7] = [
        ConfigName::RankProfiles,
        ConfigName::Attributes,
        ConfigName::IndexSchema,
        ConfigName::Summary,
        ConfigName::SummaryMap,
        ConfigName::JuniperRc,
        ConfigName::ImportedFields,
    ];

    /// The on-disk filename for this config within `config-<serial>/`.
    pub const fn filename(self) -> &'static str {
        match self {
            ConfigName::RankProfiles => "rankprofiles.cfg",
            ConfigName::Attributes => "attributes.cfg",
            ConfigName::IndexSchema => "indexschema.cfg",
            ConfigName::Summary => "summary.cfg",
            ConfigName::SummaryMap => "summarymap.cfg",
            ConfigName::JuniperRc => "juniperrc.cfg",
            ConfigName::ImportedFields => "importedfields.cfg",
        }
    }
}

/// `(config name, config id)` — the key a config value is published under
/// (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    pub name: ConfigName,
    pub config_id: String,
}

impl ConfigKey {
    pub fn new(name: ConfigName, config_id: impl Into<String>) -> Self {
        Self {
            name,
            config_id: config_id.into(),
        }
    }
}

/// A set of typed configs keyed by `(config name, config id)`, carrying a
/// generation number, an identity hash, and an `applyOnRestart` flag (spec
/// §3).
///
/// Values are kept as opaque byte payloads here: the typed config schemas
/// themselves (rank profiles, attributes, ...) belong to the surrounding
/// search/content layers, which is exactly the kind of reflection-driven
/// config binding spec §9 says should *not* leak into this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    generation: ConfigGeneration,
    apply_on_restart: bool,
    values: BTreeMap<ConfigKey, Vec<u8>>,
}

impl ConfigSnapshot {
    pub fn new(generation: ConfigGeneration, apply_on_restart: bool) -> Self {
        Self {
            generation,
            apply_on_restart,
            values: BTreeMap::new(),
        }
    }

    pub fn generation(&self) -> ConfigGeneration {
        self.generation
    }

    pub fn apply_on_restart(&self) -> bool {
        self.apply_on_restart
    }

    #[must_use]
    pub fn with_value(mut self, key: ConfigKey, bytes: Vec<u8>) -> Self {
        self.values.insert(key, bytes);
        self
    }

    pub fn get(&self, key: &ConfigKey) -> Option<&[u8]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ConfigKey> {
        self.values.keys()
    }

    /// Content hash of the full snapshot (xxhash64 role per spec §3; see
    /// [`crate::checksum::identity_hash`] for the algorithm used).
    pub fn identity_hash(&self) -> u64 {
        identity_hash(
            self.values
                .iter()
                .map(|(k, v)| (k.name.filename(), crate::checksum::fnv1a_64(v))),
        )
    }
}
