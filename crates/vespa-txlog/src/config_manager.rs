//! On-disk configuration-generation layout (spec §4.7, §6).
//!
//! ```text
//! out/
//! └── config-<serial>/
//!     ├── rankprofiles.cfg
//!     ├── attributes.cfg
//!     ├── indexschema.cfg
//!     ├── summary.cfg
//!     ├── summarymap.cfg
//!     ├── juniperrc.cfg
//!     ├── importedfields.cfg
//!     └── extraconfigs.dat   (optional)
//! ```
//!
//! Each `.cfg` file holds one length-prefixed binary record (reusing
//! [`crate::record`]'s framing primitives is unnecessary here since there
//! is exactly one payload per file); `extraconfigs.dat` may be absent
//! entirely, per spec §4.7 ("deserialization accepts a missing
//! `extraconfigs.dat`").

use std::fs;
use std::path::PathBuf;

use vespa_types::{ConfigGeneration, ConfigName};

use crate::error::TxLogError;

const EXTRA_CONFIGS_FILENAME: &str = "extraconfigs.dat";

fn generation_dir_name(generation: ConfigGeneration) -> String {
    format!("config-{}", generation.get())
}

/// A single configuration generation's on-disk contents, read back by
/// [`FileConfigManager::read_generation`].
#[derive(Debug, Clone, Default)]
pub struct ConfigGenerationDir {
    pub files: Vec<(ConfigName, Vec<u8>)>,
    pub extra_configs: Option<Vec<u8>>,
}

/// Writes and reads per-generation configuration directories under a root
/// `out/` path.
pub struct FileConfigManager {
    root: PathBuf,
}

impl FileConfigManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn generation_path(&self, generation: ConfigGeneration) -> PathBuf {
        self.root.join(generation_dir_name(generation))
    }

    /// Writes the full deterministic snapshot for one generation. All
    /// files in `ConfigName::ALL` not present in `dir.files` are treated
    /// as absent (not written) — the caller decides which configs apply to
    /// which generation, matching the `ReconfigParams` bit-set from spec
    /// §4.2 (not every reconfiguration touches every config name).
    pub fn write_generation(
        &self,
        generation: ConfigGeneration,
        dir: &ConfigGenerationDir,
    ) -> Result<(), TxLogError> {
        let path = self.generation_path(generation);
        fs::create_dir_all(&path).map_err(|source| TxLogError::Io {
            path: path.clone(),
            source,
        })?;

        for (name, bytes) in &dir.files {
            let file_path = path.join(name.filename());
            fs::write(&file_path, bytes).map_err(|source| TxLogError::Io {
                path: file_path,
                source,
            })?;
        }

        if let Some(extra) = &dir.extra_configs {
            let file_path = path.join(EXTRA_CONFIGS_FILENAME);
            fs::write(&file_path, extra).map_err(|source| TxLogError::Io {
                path: file_path,
                source,
            })?;
        }

        Ok(())
    }

    /// Reads back a generation's directory. Missing `.cfg` files are
    /// simply absent from `files`; a missing `extraconfigs.dat` yields
    /// `extra_configs: None` rather than an error (spec §4.7).
    pub fn read_generation(
        &self,
        generation: ConfigGeneration,
    ) -> Result<ConfigGenerationDir, TxLogError> {
        let path = self.generation_path(generation);
        let mut files = Vec::new();
        for name in ConfigName::ALL {
            let file_path = path.join(name.filename());
            if file_path.exists() {
                let bytes = fs::read(&file_path).map_err(|source| TxLogError::Io {
                    path: file_path,
                    source,
                })?;
                files.push((name, bytes));
            }
        }

        let extra_path = path.join(EXTRA_CONFIGS_FILENAME);
        let extra_configs = if extra_path.exists() {
            Some(fs::read(&extra_path).map_err(|source| TxLogError::Io {
                path: extra_path,
                source,
            })?)
        } else {
            None
        };

        Ok(ConfigGenerationDir {
            files,
            extra_configs,
        })
    }

    /// Lists generations present under the root, ascending.
    pub fn list_generations(&self) -> Result<Vec<ConfigGeneration>, TxLogError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut generations = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|source| TxLogError::Io {
            path: self.root.clone(),
            source,
        })? {
            let entry = entry.map_err(|source| TxLogError::Io {
                path: self.root.clone(),
                source,
            })?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(serial_str) = name.strip_prefix("config-") {
                    if let Ok(serial) = serial_str.parse::<u64>() {
                        generations.push(ConfigGeneration::new(serial));
                    }
                }
            }
        }
        generations.sort();
        Ok(generations)
    }
}
