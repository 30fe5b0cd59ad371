//! Document DB: feed, search, reconfigure, and the startup sequence
//! (spec §4.2).
//!
//! `init -> replay -> apply config -> online`, each transition a
//! single-threaded state change on the DB's conceptual master executor.
//! Writes arriving through [`DocumentDb::feed`] while not yet `Online`
//! are deferred and applied, in arrival order, at the replay/online
//! boundary — mirroring the teacher's separation of pure state
//! transitions from effect execution (`kmb-kernel::state`/`effects`),
//! generalized here from "apply a committed command" to "apply a feed
//! operation once the DB is ready to accept it."

use std::collections::HashMap;

use vespa_types::{ConfigSnapshot, DocumentId, SerialNumber};

use crate::error::FeedError;
use crate::reconfig::ReconfigParams;
use crate::subdb::{SubDbCounts, SubDbKind};
use crate::throttle::{TokenBucket, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbState {
    Init,
    Replaying,
    ApplyingConfig,
    Online,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOp {
    Put { doc_id: DocumentId, active: bool },
    Update { doc_id: DocumentId },
    Remove { doc_id: DocumentId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    Applied,
    Deferred,
}

struct PendingOp {
    op: FeedOp,
    serial: SerialNumber,
}

/// The feed pipeline for one document DB instance.
pub struct DocumentDb {
    state: DbState,
    replay_cursor: SerialNumber,
    deferred: Vec<PendingOp>,
    pending_reconfig: Option<ConfigSnapshot>,
    current_config: Option<ConfigSnapshot>,
    sub_dbs: HashMap<SubDbKind, SubDbCounts>,
    /// Tracks which sub-DB last held each document id, so `remove` and
    /// reapplied `put` know which counts to adjust.
    doc_location: HashMap<DocumentId, (SubDbKind, bool)>,
    replay_tokens: TokenBucket,
    live_tokens: TokenBucket,
}

impl DocumentDb {
    pub fn new(replay_capacity: usize, live_capacity: usize) -> Self {
        let mut sub_dbs = HashMap::new();
        sub_dbs.insert(SubDbKind::Ready, SubDbCounts::default());
        sub_dbs.insert(SubDbKind::NotReady, SubDbCounts::default());
        sub_dbs.insert(SubDbKind::Removed, SubDbCounts::default());

        Self {
            state: DbState::Init,
            replay_cursor: SerialNumber::ZERO,
            deferred: Vec::new(),
            pending_reconfig: None,
            current_config: None,
            sub_dbs,
            doc_location: HashMap::new(),
            replay_tokens: TokenBucket::new(TokenKind::Replay, replay_capacity),
            live_tokens: TokenBucket::new(TokenKind::Live, live_capacity),
        }
    }

    pub fn state(&self) -> DbState {
        self.state
    }

    /// Transitions `Init -> Replaying`. Must be the first call.
    pub fn start_replay(&mut self) {
        debug_assert_eq!(self.state, DbState::Init);
        self.state = DbState::Replaying;
        tracing::debug!("document db entering replay");
    }

    /// Applies one record read back from the transaction log during
    /// replay. Uses the replay token bucket, which is independent of the
    /// live feed's bucket so recovery can always make progress.
    pub fn replay_record(&mut self, op: FeedOp, serial: SerialNumber) -> Result<(), FeedError> {
        debug_assert_eq!(self.state, DbState::Replaying);
        if !self.replay_tokens.try_acquire() {
            // Synchronous replay has no queueing concept of its own; the
            // caller retries once prior ops release their token.
            return Err(FeedError::Core(vespa_types::CoreError::ResourceExhausted {
                resource: "replay_tokens",
                used_ratio: 1.0,
                limit_ratio: 1.0,
            }));
        }
        self.apply_op(&op, serial);
        self.replay_tokens.release();
        self.replay_cursor = serial;
        Ok(())
    }

    /// Transitions `Replaying -> ApplyingConfig` and installs the live
    /// config snapshot. Any reconfiguration that arrived during replay is
    /// folded in at this boundary, per spec §4.2.
    pub fn finish_replay_apply_config(&mut self, snapshot: ConfigSnapshot) -> ReconfigParams {
        debug_assert_eq!(self.state, DbState::Replaying);
        self.state = DbState::ApplyingConfig;

        let effective = self.pending_reconfig.take().unwrap_or(snapshot);
        let params = match &self.current_config {
            Some(old) => ReconfigParams::diff(old, &effective),
            None => ReconfigParams::none_changed(),
        };
        self.current_config = Some(effective);
        self.go_online();
        params
    }

    fn go_online(&mut self) {
        self.state = DbState::Online;
        let pending = std::mem::take(&mut self.deferred);
        tracing::debug!(deferred = pending.len(), "document db online, applying deferred writes");
        for pending_op in pending {
            self.apply_op(&pending_op.op, pending_op.serial);
        }
    }

    /// External feed entry point. During replay or config application,
    /// operations are deferred (queued), never rejected; once online they
    /// apply immediately, gated by the live token bucket.
    pub fn feed(&mut self, op: FeedOp, serial: SerialNumber) -> Result<FeedOutcome, FeedError> {
        match self.state {
            DbState::Init => Err(FeedError::NotStarted),
            DbState::Replaying | DbState::ApplyingConfig => {
                self.deferred.push(PendingOp { op, serial });
                Ok(FeedOutcome::Deferred)
            }
            DbState::Online => {
                if !self.live_tokens.try_acquire() {
                    self.deferred.push(PendingOp { op, serial });
                    return Ok(FeedOutcome::Deferred);
                }
                self.apply_op(&op, serial);
                self.live_tokens.release();
                Ok(FeedOutcome::Applied)
            }
        }
    }

    fn apply_op(&mut self, op: &FeedOp, _serial: SerialNumber) {
        match op {
            FeedOp::Put { doc_id, active } => {
                if let Some((old_kind, was_active)) = self.doc_location.get(doc_id).copied() {
                    if let Some(counts) = self.sub_dbs.get_mut(&old_kind) {
                        counts.apply_remove(was_active);
                    }
                }
                let kind = if *active { SubDbKind::Ready } else { SubDbKind::NotReady };
                self.sub_dbs.entry(kind).or_default().apply_put(*active);
                self.doc_location.insert(doc_id.clone(), (kind, *active));
            }
            FeedOp::Update { doc_id } => {
                tracing::trace!(doc = %doc_id, "applied update");
            }
            FeedOp::Remove { doc_id } => {
                if let Some((old_kind, was_active)) = self.doc_location.remove(doc_id) {
                    if let Some(counts) = self.sub_dbs.get_mut(&old_kind) {
                        counts.apply_remove(was_active);
                    }
                }
                self.sub_dbs.entry(SubDbKind::Removed).or_default().apply_put(false);
            }
        }
    }

    /// Schedules a reconfiguration. If replay is still in progress, it is
    /// held and applied at the online boundary instead of mid-replay.
    pub fn reconfigure(&mut self, snapshot: ConfigSnapshot) -> Option<ReconfigParams> {
        match self.state {
            DbState::Replaying | DbState::ApplyingConfig => {
                self.pending_reconfig = Some(snapshot);
                None
            }
            DbState::Online | DbState::Init => {
                let params = match &self.current_config {
                    Some(old) => ReconfigParams::diff(old, &snapshot),
                    None => ReconfigParams::none_changed(),
                };
                self.current_config = Some(snapshot);
                Some(params)
            }
        }
    }

    pub fn get_num_docs(&self) -> u64 {
        self.sub_dbs.values().map(|c| c.num_docs).sum()
    }

    pub fn get_num_active_docs(&self) -> u64 {
        self.sub_dbs.values().map(|c| c.num_active_docs).sum()
    }

    pub fn replay_cursor(&self) -> SerialNumber {
        self.replay_cursor
    }

    pub fn sub_db_counts(&self, kind: SubDbKind) -> SubDbCounts {
        self.sub_dbs.get(&kind).copied().unwrap_or_default()
    }

    /// Forces the transaction log durable up to `serial`.
    pub fn sync(&self, txlog: &mut vespa_txlog::TransactionLog, serial: SerialNumber) -> Result<(), FeedError> {
        txlog.sync(serial)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn doc(key: &str) -> DocumentId {
        DocumentId::from_str(&format!("id:ns:type::{key}")).unwrap()
    }

    #[test]
    fn writes_during_replay_are_deferred_not_rejected() {
        let mut db = DocumentDb::new(4, 4);
        db.start_replay();
        let outcome = db
            .feed(FeedOp::Put { doc_id: doc("a"), active: true }, SerialNumber::new(1))
            .unwrap();
        assert_eq!(outcome, FeedOutcome::Deferred);
        assert_eq!(db.get_num_docs(), 0);
    }

    #[test]
    fn deferred_writes_apply_at_online_boundary() {
        let mut db = DocumentDb::new(4, 4);
        db.start_replay();
        db.feed(FeedOp::Put { doc_id: doc("a"), active: true }, SerialNumber::new(5))
            .unwrap();
        db.finish_replay_apply_config(ConfigSnapshot::new(vespa_types::ConfigGeneration::new(1), false));
        assert_eq!(db.state(), DbState::Online);
        assert_eq!(db.get_num_docs(), 1);
        assert_eq!(db.get_num_active_docs(), 1);
    }

    #[test]
    fn online_feed_applies_immediately() {
        let mut db = DocumentDb::new(4, 4);
        db.start_replay();
        db.finish_replay_apply_config(ConfigSnapshot::new(vespa_types::ConfigGeneration::new(1), false));
        let outcome = db
            .feed(FeedOp::Put { doc_id: doc("a"), active: false }, SerialNumber::new(1))
            .unwrap();
        assert_eq!(outcome, FeedOutcome::Applied);
        assert_eq!(db.get_num_docs(), 1);
        assert_eq!(db.get_num_active_docs(), 0);
    }

    #[test]
    fn reconfiguration_during_replay_is_applied_at_boundary() {
        let mut db = DocumentDb::new(4, 4);
        db.start_replay();
        let key = vespa_types::ConfigKey::new(vespa_types::ConfigName::Attributes, "default");
        let snapshot = ConfigSnapshot::new(vespa_types::ConfigGeneration::new(2), false)
            .with_value(key, b"v2".to_vec());
        assert!(db.reconfigure(snapshot).is_none());
        let params = db.finish_replay_apply_config(ConfigSnapshot::new(
            vespa_types::ConfigGeneration::new(1),
            false,
        ));
        // Effective snapshot is the one queued during replay (generation 2),
        // not the one passed directly to finish_replay_apply_config.
        assert!(!params.any_changed());
        assert_eq!(db.state(), DbState::Online);
    }

    #[test]
    fn remove_clears_doc_from_its_subdb() {
        let mut db = DocumentDb::new(4, 4);
        db.start_replay();
        db.finish_replay_apply_config(ConfigSnapshot::new(vespa_types::ConfigGeneration::new(1), false));
        db.feed(FeedOp::Put { doc_id: doc("a"), active: true }, SerialNumber::new(1))
            .unwrap();
        db.feed(FeedOp::Remove { doc_id: doc("a") }, SerialNumber::new(2))
            .unwrap();
        assert_eq!(db.get_num_active_docs(), 0);
        assert_eq!(db.sub_db_counts(SubDbKind::Removed).num_docs, 1);
    }

    /// One of a handful of fixed document ids a replay sequence draws
    /// from, small enough that puts/removes/updates on the same id
    /// actually collide and exercise the doc-location bookkeeping.
    fn scripted_op(choice: (u8, bool, u8)) -> FeedOp {
        let (doc_choice, active, op_choice) = choice;
        let doc_id = doc(&format!("d{}", doc_choice % 4));
        match op_choice % 3 {
            0 => FeedOp::Put { doc_id, active },
            1 => FeedOp::Update { doc_id },
            _ => FeedOp::Remove { doc_id },
        }
    }

    fn replay_sequence(ops: &[FeedOp]) -> (u64, u64, SubDbCounts, SubDbCounts, SubDbCounts) {
        let mut db = DocumentDb::new(1024, 1024);
        db.start_replay();
        for (i, op) in ops.iter().enumerate() {
            db.replay_record(op.clone(), SerialNumber::new(i as u64 + 1)).unwrap();
        }
        db.finish_replay_apply_config(ConfigSnapshot::new(vespa_types::ConfigGeneration::new(1), false));
        (
            db.get_num_docs(),
            db.get_num_active_docs(),
            db.sub_db_counts(SubDbKind::Ready),
            db.sub_db_counts(SubDbKind::NotReady),
            db.sub_db_counts(SubDbKind::Removed),
        )
    }

    proptest! {
        /// Testable property 3 (spec §8): replaying the same feed sequence
        /// twice over a fresh document DB yields identical final sub-DB
        /// content, up to the storage-representation equivalence this
        /// crate deals in (document counts per sub-DB).
        #[test]
        fn serial_replay_determinism(
            choices in prop::collection::vec((0u8..8, any::<bool>(), 0u8..6), 0..40)
        ) {
            let ops: Vec<FeedOp> = choices.into_iter().map(scripted_op).collect();
            let first = replay_sequence(&ops);
            let second = replay_sequence(&ops);
            prop_assert_eq!(first, second);
        }
    }
}
