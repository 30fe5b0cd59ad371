//! Sub-DB classification and per-sub-DB document counts (spec §4.2).
//!
//! A document DB exclusively owns three sub-DBs: `ready` documents are
//! indexed and searchable candidates, `not-ready` documents are stored
//! but excluded from search (e.g. awaiting activation), and `removed`
//! tracks tombstones kept for dedup/GC purposes (spec §4.5 references the
//! same three-way split from the distributor side).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubDbKind {
    Ready,
    NotReady,
    Removed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubDbCounts {
    pub num_docs: u64,
    pub num_active_docs: u64,
}

impl SubDbCounts {
    pub fn apply_put(&mut self, active: bool) {
        self.num_docs += 1;
        if active {
            self.num_active_docs += 1;
        }
    }

    pub fn apply_remove(&mut self, was_active: bool) {
        self.num_docs = self.num_docs.saturating_sub(1);
        if was_active {
            self.num_active_docs = self.num_active_docs.saturating_sub(1);
        }
    }
}
