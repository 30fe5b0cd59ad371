//! # vespa-config: config subscription & component graph (spec §4.1)
//!
//! Builder-pattern state throughout: methods take ownership of `self`,
//! mutate, and return `self`, covering both the subscription-set state
//! machine and the component graph generation swap. The back-off policy
//! follows the same pure-function-over-owned-state shape.

mod backoff;
mod document_type_registry;
mod error;
mod graph;
mod subscription;

pub use backoff::BackoffPolicy;
pub use document_type_registry::{DocumentTypeDescriptor, DocumentTypeRegistry};
pub use error::ConfigError;
pub use graph::{ComponentGraph, ComponentNode, GraphBuildError, NodeId};
pub use subscription::{SubscriptionSet, SubscriptionState};
