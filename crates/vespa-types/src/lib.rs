//! # vespa-types: core data model for the Vespa serving-path core
//!
//! Shared types used across the content-layer and search-layer crates:
//! - Document identity ([`DocumentId`], [`GlobalId`])
//! - Bucket addressing ([`BucketId`], [`BucketSpace`])
//! - Serial numbers and configuration generations ([`SerialNumber`],
//!   [`ConfigGeneration`])
//! - Attribute storage handles ([`EntryRef`])
//! - Query results ([`Hit`], [`CoverageRecord`], [`DegradationReason`])
//! - The shared error taxonomy ([`error`]) and checksum primitives
//!   ([`checksum`]) that every other `vespa-*` crate builds on.

mod bucket;
pub mod checksum;
mod config_snapshot;
mod coverage;
mod document_id;
mod entry_ref;
pub mod error;
mod hit;
pub mod metrics;
mod serial;

pub use bucket::{BucketId, BucketSpace};
pub use config_snapshot::{ConfigGeneration, ConfigKey, ConfigName, ConfigSnapshot};
pub use coverage::{CoverageRecord, DegradationReason};
pub use document_id::{DocumentId, DocumentIdError, GlobalId};
pub use entry_ref::EntryRef;
pub use hit::Hit;
pub use serial::SerialNumber;
