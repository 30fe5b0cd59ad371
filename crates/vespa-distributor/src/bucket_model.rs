//! Bucket ownership and replica selection (spec §4.5).
//!
//! Maps a document id to its bucket, tracks which content nodes hold a
//! replica of that bucket, and decides per-node routing. A bucket's
//! replica set is a small, explicit list of node ids rather than a ring
//! or consistent-hash abstraction.

use std::collections::HashMap;

use vespa_types::{BucketId, BucketSpace, DocumentId};

/// A content node identity. Opaque beyond equality/ordering; the real
/// topology (host, port, distribution key) lives in the surrounding
/// cluster-management layer (external collaborator, spec §1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u16);

/// Per-bucket replica bookkeeping: which nodes hold a replica, which one
/// is primary (bucket owner, spec §5 "Bucket database: single-writer per
/// bucket owner"), and whether this bucket is activated for search.
#[derive(Debug, Clone)]
pub struct BucketInfo {
    pub space: BucketSpace,
    replicas: Vec<NodeId>,
    owner_index: usize,
    active: bool,
}

impl BucketInfo {
    pub fn new(space: BucketSpace, replicas: Vec<NodeId>) -> Self {
        assert!(!replicas.is_empty(), "a bucket must have at least one replica");
        Self {
            space,
            replicas,
            owner_index: 0,
            active: false,
        }
    }

    pub fn replicas(&self) -> &[NodeId] {
        &self.replicas
    }

    /// The node currently holding the primary replica: the single writer
    /// for this bucket until ownership transfers (spec §5).
    pub fn owner(&self) -> NodeId {
        self.replicas[self.owner_index]
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Hands bucket ownership off to another replica already in the
    /// replica set. Readers remain consistent by observing the new owner
    /// only after this call returns (spec §5, "readers consistent via
    /// hand-off during ownership transfer").
    pub fn transfer_ownership(&mut self, to: NodeId) -> bool {
        if let Some(idx) = self.replicas.iter().position(|&n| n == to) {
            self.owner_index = idx;
            true
        } else {
            false
        }
    }
}

/// The distributor's view of the bucket space: which buckets exist, who
/// holds them, and at what split level document ids currently map.
pub struct BucketModel {
    used_bits: u8,
    buckets: HashMap<BucketId, BucketInfo>,
}

impl BucketModel {
    pub fn new(used_bits: u8) -> Self {
        Self {
            used_bits,
            buckets: HashMap::new(),
        }
    }

    pub fn bucket_for(&self, doc_id: &DocumentId) -> BucketId {
        BucketId::for_document(doc_id, self.used_bits)
    }

    pub fn insert(&mut self, bucket: BucketId, info: BucketInfo) {
        self.buckets.insert(bucket, info);
    }

    pub fn get(&self, bucket: BucketId) -> Option<&BucketInfo> {
        self.buckets.get(&bucket)
    }

    pub fn get_mut(&mut self, bucket: BucketId) -> Option<&mut BucketInfo> {
        self.buckets.get_mut(&bucket)
    }

    /// Routes a document write to its bucket owner. Returns `None` if the
    /// bucket is not yet known to this distributor (e.g. mid-split).
    pub fn route_write(&self, doc_id: &DocumentId) -> Option<NodeId> {
        let bucket = self.bucket_for(doc_id);
        self.buckets.get(&bucket).map(BucketInfo::owner)
    }

    /// Splits a bucket into two children, copying the parent's replica set
    /// and space to both (spec §3: "buckets are further split by a
    /// configurable bit count").
    pub fn split(&mut self, parent: BucketId) -> Option<(BucketId, BucketId)> {
        let info = self.buckets.remove(&parent)?;
        let (lo, hi) = parent.split();
        self.buckets.insert(lo, info.clone());
        self.buckets.insert(hi, info);
        Some((lo, hi))
    }

    /// Buckets in the global space that have not yet converged (fewer than
    /// `replication_factor` active replicas agreeing), used by the
    /// activation-inhibit policy (spec §4.5).
    pub fn pending_global_buckets(&self) -> impl Iterator<Item = BucketId> + '_ {
        self.buckets
            .iter()
            .filter(|(_, info)| info.space.is_global() && !info.is_active())
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn doc(key: &str) -> DocumentId {
        DocumentId::from_str(&format!("id:ns:type::{key}")).unwrap()
    }

    #[test]
    fn routes_write_to_owner() {
        let mut model = BucketModel::new(8);
        let bucket = model.bucket_for(&doc("a"));
        model.insert(bucket, BucketInfo::new(BucketSpace::Default, vec![NodeId(1), NodeId(2)]));
        assert_eq!(model.route_write(&doc("a")), Some(NodeId(1)));
    }

    #[test]
    fn ownership_transfer_changes_owner() {
        let mut info = BucketInfo::new(BucketSpace::Default, vec![NodeId(1), NodeId(2)]);
        assert!(info.transfer_ownership(NodeId(2)));
        assert_eq!(info.owner(), NodeId(2));
        assert!(!info.transfer_ownership(NodeId(99)));
    }

    #[test]
    fn split_preserves_replica_set_on_both_children() {
        let mut model = BucketModel::new(4);
        let bucket = model.bucket_for(&doc("a"));
        model.insert(bucket, BucketInfo::new(BucketSpace::Global, vec![NodeId(3)]));
        let (lo, hi) = model.split(bucket).unwrap();
        assert_eq!(model.get(lo).unwrap().replicas(), &[NodeId(3)]);
        assert_eq!(model.get(hi).unwrap().replicas(), &[NodeId(3)]);
        assert!(model.get(bucket).is_none());
    }

    #[test]
    fn pending_global_buckets_excludes_active_and_default_space() {
        let mut model = BucketModel::new(32);
        let b1 = model.bucket_for(&doc("a"));
        let b2 = model.bucket_for(&doc("b"));
        model.insert(b1, BucketInfo::new(BucketSpace::Global, vec![NodeId(1)]));
        let mut active_global = BucketInfo::new(BucketSpace::Global, vec![NodeId(1)]);
        active_global.set_active(true);
        model.insert(b2, active_global);

        let pending: Vec<_> = model.pending_global_buckets().collect();
        assert_eq!(pending, vec![b1]);
    }
}
