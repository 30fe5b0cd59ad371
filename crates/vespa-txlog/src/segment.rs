//! Segment-file storage for the transaction log.
//!
//! File layout:
//!
//! ```text
//! {dir}/
//! ├── segment_000000.log   <- completed segment, ends with a 4-byte CRC32 trailer
//! ├── segment_000001.log   <- active (writable) segment, no trailer yet
//! └── manifest.json        <- ordered segment list + byte ranges
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vespa_types::checksum::crc32;
use vespa_types::SerialNumber;

use crate::error::TxLogError;
use crate::record::TxRecord;

const MANIFEST_FILENAME: &str = "manifest.json";
const DEFAULT_MAX_SEGMENT_SIZE: u64 = 64 * 1024 * 1024;

fn segment_filename(segment_num: u32) -> String {
    format!("segment_{segment_num:06}.log")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SegmentMeta {
    segment_num: u32,
    /// Present once the segment is closed (rotated past); `None` for the
    /// active segment.
    checksum: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Manifest {
    segments: Vec<SegmentMeta>,
}

/// A record recovered during replay, tagged with the segment it came from
/// (useful for the "Backend communication timeout"-style trace entries
/// elsewhere in the pipeline, and for diagnosing corruption).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedRecord {
    pub segment_num: u32,
    pub record: TxRecord,
}

/// Durable, append-only, single-writer/multi-reader transaction log.
pub struct TransactionLog {
    dir: PathBuf,
    max_segment_size: u64,
    manifest: Manifest,
    active_segment_num: u32,
    active_file: File,
    active_len: u64,
}

impl TransactionLog {
    /// Opens (creating if necessary) a transaction log rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TxLogError> {
        Self::open_with_segment_size(dir, DEFAULT_MAX_SEGMENT_SIZE)
    }

    pub fn open_with_segment_size(
        dir: impl Into<PathBuf>,
        max_segment_size: u64,
    ) -> Result<Self, TxLogError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| TxLogError::Io {
            path: dir.clone(),
            source,
        })?;

        let manifest_path = dir.join(MANIFEST_FILENAME);
        let manifest = if manifest_path.exists() {
            let bytes = fs::read(&manifest_path).map_err(|source| TxLogError::Io {
                path: manifest_path.clone(),
                source,
            })?;
            serde_json::from_slice(&bytes)
                .map_err(|e| TxLogError::Serialization(e.to_string()))?
        } else {
            Manifest {
                segments: vec![SegmentMeta {
                    segment_num: 0,
                    checksum: None,
                }],
            }
        };

        let active_segment_num = manifest
            .segments
            .last()
            .map(|s| s.segment_num)
            .unwrap_or(0);
        let active_path = dir.join(segment_filename(active_segment_num));
        let active_file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&active_path)
            .map_err(|source| TxLogError::Io {
                path: active_path.clone(),
                source,
            })?;
        let active_len = active_file
            .metadata()
            .map_err(|source| TxLogError::Io {
                path: active_path,
                source,
            })?
            .len();

        let mut log = Self {
            dir,
            max_segment_size,
            manifest,
            active_segment_num,
            active_file,
            active_len,
        };
        log.write_manifest()?;
        Ok(log)
    }

    fn write_manifest(&self) -> Result<(), TxLogError> {
        let path = self.dir.join(MANIFEST_FILENAME);
        let bytes = serde_json::to_vec_pretty(&self.manifest)
            .map_err(|e| TxLogError::Serialization(e.to_string()))?;
        fs::write(&path, bytes).map_err(|source| TxLogError::Io { path, source })
    }

    /// Appends a record to the active segment, rotating to a new segment
    /// first if the active one would exceed `max_segment_size`.
    pub fn append(&mut self, record: &TxRecord) -> Result<(), TxLogError> {
        let encoded = record.encode();
        if self.active_len > 0 && self.active_len + encoded.len() as u64 > self.max_segment_size {
            self.rotate()?;
        }
        self.active_file
            .write_all(&encoded)
            .map_err(|source| TxLogError::Io {
                path: self.active_path(),
                source,
            })?;
        self.active_len += encoded.len() as u64;
        Ok(())
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(segment_filename(self.active_segment_num))
    }

    /// Closes the active segment (writing its CRC32 trailer, spec §6:
    /// "checksum at end of each file segment") and opens a new one.
    fn rotate(&mut self) -> Result<(), TxLogError> {
        let path = self.active_path();
        let contents = fs::read(&path).map_err(|source| TxLogError::Io {
            path: path.clone(),
            source,
        })?;
        let checksum = crc32(&contents);
        self.active_file
            .write_all(&checksum.to_be_bytes())
            .map_err(|source| TxLogError::Io {
                path: path.clone(),
                source,
            })?;

        if let Some(meta) = self
            .manifest
            .segments
            .iter_mut()
            .find(|s| s.segment_num == self.active_segment_num)
        {
            meta.checksum = Some(checksum);
        }

        let next_num = self.active_segment_num + 1;
        self.manifest.segments.push(SegmentMeta {
            segment_num: next_num,
            checksum: None,
        });
        self.write_manifest()?;

        let next_path = self.dir.join(segment_filename(next_num));
        self.active_file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&next_path)
            .map_err(|source| TxLogError::Io {
                path: next_path,
                source,
            })?;
        self.active_segment_num = next_num;
        self.active_len = 0;
        Ok(())
    }

    /// Flushes and fsyncs the active segment. Returns once all records up
    /// to and including `serial` are durably flushed, per spec §4.2's
    /// `sync(serialNum)` contract (this implementation fsyncs
    /// unconditionally, which trivially satisfies "up to and including
    /// `serial`" for any `serial` already appended).
    pub fn sync(&mut self, _serial: SerialNumber) -> Result<(), TxLogError> {
        self.active_file
            .sync_all()
            .map_err(|source| TxLogError::Io {
                path: self.active_path(),
                source,
            })
    }

    /// Replays all records at or after `start_serial`, in serial order.
    ///
    /// Closed segments are checksum-verified; a mismatch is a
    /// [`TxLogError::CorruptedRecord`] (data-corruption, spec §7 — fatal at
    /// node scope). The active (last) segment is read leniently: a
    /// declared-but-missing trailing record is silently dropped rather
    /// than treated as an error (spec §6: "replay tolerates a truncated
    /// trailing record").
    pub fn replay(&self, start_serial: SerialNumber) -> Result<Vec<ReplayedRecord>, TxLogError> {
        let mut out = Vec::new();
        let last_segment_num = self.active_segment_num;

        for meta in &self.manifest.segments {
            let path = self.dir.join(segment_filename(meta.segment_num));
            let mut contents = Vec::new();
            if path.exists() {
                File::open(&path)
                    .and_then(|mut f| f.read_to_end(&mut contents))
                    .map_err(|source| TxLogError::Io {
                        path: path.clone(),
                        source,
                    })?;
            }

            let is_active = meta.segment_num == last_segment_num;
            let body = if let Some(expected) = meta.checksum {
                if contents.len() < 4 {
                    return Err(TxLogError::CorruptedRecord {
                        path,
                        serial: 0,
                        reason: "closed segment missing checksum trailer".into(),
                    });
                }
                let split = contents.len() - 4;
                let actual = crc32(&contents[..split]);
                if actual != expected {
                    return Err(TxLogError::CorruptedRecord {
                        path,
                        serial: 0,
                        reason: format!(
                            "segment checksum mismatch: expected {expected:#x}, got {actual:#x}"
                        ),
                    });
                }
                &contents[..split]
            } else {
                &contents[..]
            };

            let mut offset = 0usize;
            loop {
                match TxRecord::try_decode(&body[offset..]) {
                    Ok(Some((record, consumed))) => {
                        if record.serial() >= start_serial {
                            out.push(ReplayedRecord {
                                segment_num: meta.segment_num,
                                record,
                            });
                        }
                        offset += consumed;
                    }
                    Ok(None) => {
                        if offset != body.len() && !is_active {
                            return Err(TxLogError::CorruptedRecord {
                                path,
                                serial: 0,
                                reason: "truncated record in a closed segment".into(),
                            });
                        }
                        break;
                    }
                    Err(e) => {
                        return Err(TxLogError::CorruptedRecord {
                            path,
                            serial: 0,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        out.sort_by_key(|r| r.record.serial());
        Ok(out)
    }
}
