//! # vespa-server: node wiring, executors, and the CLI command surface
//!
//! This crate is the outermost layer of the serving-path core: it wires
//! the per-subsystem crates (`vespa-config`, `vespa-txlog`,
//! `vespa-storage`, `vespa-feed`, `vespa-distributor`, `vespa-dispatch`)
//! into the two node roles the spec describes ([`node::ContentNode`],
//! [`node::SearchNode`]), defines the executor seams of the concurrency
//! model (spec §5), and specifies the typed CLI command surface (spec
//! §6) that an external CLI tool targets.
//!
//! Real thread lifecycle, real sockets, and argument parsing all belong
//! to the surrounding process (external collaborator, spec §1); this
//! crate stops at the trait/type boundary those concerns plug into,
//! keeping the pure routing logic separate from whatever I/O loop
//! actually drives it.

pub mod cli;
pub mod error;
pub mod executor;
pub mod node;

pub use error::ServerError;
pub use executor::{MasterExecutor, RecordingTransport, SharedExecutor, SubmitResult, TransportExecutor, WriteExecutor, WriteKey};
pub use node::{ContentNode, SearchNode};
