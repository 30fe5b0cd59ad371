//! # vespa-txlog: durable transaction log and on-disk config layout
//!
//! Implements spec §4.7: the transaction log is an append-only stream whose
//! record boundaries carry serial numbers; replay reads records at or
//! after a start serial and delivers them in order. The file config
//! manager persists one directory per configuration generation
//! (`config-<serial>/...`) using the same length-prefixed binary framing
//! and checksum discipline as the log records.
//!
//! An append-only segment log: numbered segment files that rotate on
//! size, a manifest tracking offset ranges, and a checksum trailer for
//! corruption detection on replay.

mod config_manager;
mod error;
mod record;
mod segment;

pub use config_manager::{ConfigGenerationDir, FileConfigManager};
pub use error::TxLogError;
pub use record::{RecordKind, TxRecord};
pub use segment::{ReplayedRecord, TransactionLog};
