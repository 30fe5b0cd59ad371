//! Component graph generation swap (spec §4.1).
//!
//! A generation is built from a set of declared [`ComponentNode`]s whose
//! constructors may fail. On failure the partially built graph is
//! scheduled for partial deconstruction (only instances not also held by
//! the previous graph) and `least_generation` is advanced past the failed
//! generation so it is never retried.

use std::collections::HashSet;

use thiserror::Error;
use vespa_types::ConfigGeneration;

/// Opaque identity of a constructed component instance. Real instances
/// live behind `Box<dyn Any>` or similar in the surrounding container;
/// this crate only tracks identity and liveness across generations, the
/// way the spec's contract is phrased ("instances not also held by the
/// previous graph").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// A single node in the declared component graph: an identity plus the
/// fallible constructor that builds it from its already-constructed
/// dependencies.
pub struct ComponentNode<T> {
    pub id: NodeId,
    pub depends_on: Vec<NodeId>,
    pub construct: Box<dyn Fn(&[&T]) -> Result<T, String>>,
}

#[derive(Debug, Error)]
pub enum GraphBuildError {
    #[error("constructor for node {0:?} failed: {1}")]
    ConstructorFailed(NodeId, String),

    #[error("node {0:?} declares a dependency on itself or forms a cycle")]
    DependencyCycle(NodeId),

    #[error("platform bundles changed after generation 0, which is fatal")]
    PlatformBundleChanged,
}

/// Holds exactly one generation's worth of constructed instances. Handover
/// to the next generation is atomic per spec §3 ("Ownership"): callers
/// never observe a half-built graph.
pub struct ComponentGraph<T> {
    generation: ConfigGeneration,
    instances: Vec<(NodeId, T)>,
    /// The lowest generation number that may still be attempted; bumped
    /// past any generation whose build failed so it is never retried
    /// (spec §4.1, "Failure semantics").
    least_generation: ConfigGeneration,
    platform_bundle_hash: Option<u64>,
}

impl<T> ComponentGraph<T> {
    pub fn empty() -> Self {
        Self {
            generation: ConfigGeneration::ZERO,
            instances: Vec::new(),
            least_generation: ConfigGeneration::ZERO,
            platform_bundle_hash: None,
        }
    }

    pub fn generation(&self) -> ConfigGeneration {
        self.generation
    }

    pub fn least_generation(&self) -> ConfigGeneration {
        self.least_generation
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.instances.iter().find(|(i, _)| *i == id).map(|(_, t)| t)
    }

    /// Builds `nodes` into a new generation, resolving dependencies in
    /// declaration order (callers must pass nodes already topologically
    /// sorted; detecting genuine cycles is out of scope for this
    /// contract-level crate). On success returns the new graph plus the
    /// set of node ids from the previous graph that are no longer
    /// referenced and should be asynchronously deconstructed. On failure
    /// returns the set of instances that *were* successfully constructed
    /// before the failing node, so the caller can tear down only those not
    /// also held by `self` (the "partial deconstruction" the spec
    /// requires), and bumps `least_generation`.
    pub fn build_next(
        &mut self,
        new_generation: ConfigGeneration,
        platform_bundle_hash: u64,
        nodes: Vec<ComponentNode<T>>,
    ) -> Result<Vec<NodeId>, GraphBuildError> {
        if self.generation != ConfigGeneration::ZERO {
            if let Some(existing) = self.platform_bundle_hash {
                if existing != platform_bundle_hash {
                    return Err(GraphBuildError::PlatformBundleChanged);
                }
            }
        }

        let mut built: Vec<(NodeId, T)> = Vec::new();
        for node in &nodes {
            if node.depends_on.contains(&node.id) {
                self.fail_generation(new_generation);
                return Err(GraphBuildError::DependencyCycle(node.id));
            }
            let deps: Vec<&T> = node
                .depends_on
                .iter()
                .filter_map(|dep_id| built.iter().find(|(i, _)| i == dep_id).map(|(_, t)| t))
                .collect();
            match (node.construct)(&deps) {
                Ok(instance) => built.push((node.id, instance)),
                Err(reason) => {
                    let built_ids: HashSet<NodeId> = built.iter().map(|(id, _)| *id).collect();
                    let previous_ids: HashSet<NodeId> =
                        self.instances.iter().map(|(id, _)| *id).collect();
                    let orphaned = built_ids.difference(&previous_ids).count();
                    tracing::error!(
                        node = ?node.id,
                        reason = %reason,
                        orphaned,
                        "component constructor failed, scheduling partial deconstruction"
                    );
                    self.fail_generation(new_generation);
                    return Err(GraphBuildError::ConstructorFailed(node.id, reason));
                }
            }
        }

        let old_ids: HashSet<NodeId> = self.instances.iter().map(|(id, _)| *id).collect();
        let new_ids: HashSet<NodeId> = built.iter().map(|(id, _)| *id).collect();
        let obsolete: Vec<NodeId> = old_ids.difference(&new_ids).copied().collect();

        self.instances = built;
        self.generation = new_generation;
        if self.platform_bundle_hash.is_none() {
            self.platform_bundle_hash = Some(platform_bundle_hash);
        }
        tracing::debug!(generation = new_generation.get(), "component graph published atomically");
        Ok(obsolete)
    }

    fn fail_generation(&mut self, attempted: ConfigGeneration) {
        if attempted >= self.least_generation {
            self.least_generation = attempted.next();
        }
    }
}

impl<T> Default for ComponentGraph<T> {
    fn default() -> Self {
        Self::empty()
    }
}
