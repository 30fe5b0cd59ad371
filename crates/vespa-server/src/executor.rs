//! Executor seams for the concurrency model in spec §5.
//!
//! Four executors cooperate around one document DB:
//!
//! - [`MasterExecutor`]: strictly single-threaded; every state transition
//!   (reconfiguration, replay boundary) runs here, in submission order.
//! - [`WriteExecutor`]: bounded parallelism, sharded by a field-writer key
//!   so writes to the same key are never reordered relative to each
//!   other, while different keys proceed independently.
//! - [`SharedExecutor`]: a work-stealing-shaped pool for warmup, fusion,
//!   and docstore writes that tolerate arbitrary interleaving.
//! - [`TransportExecutor`]: owns RPC sockets; must never block on
//!   application work (spec §5, "never blocks on application work").
//!
//! None of these spin up real OS threads here — the surrounding process
//! that embeds this crate owns thread lifecycle. What this module
//! provides is the *seam*: a trait per executor role plus a
//! deterministic, synchronous reference implementation, so the feed
//! pipeline and dispatcher can be driven and tested without any real
//! concurrency, exactly as `vespa-feed`'s `Clock` trait stands in for a
//! wall clock.

use std::collections::VecDeque;

use crossbeam_queue::ArrayQueue;

/// A single-threaded task runner: tasks submitted here execute strictly
/// in submission order, on whatever thread drains the queue (spec §5:
/// "A master executor per document DB — strictly single-threaded").
#[derive(Default)]
pub struct MasterExecutor {
    queue: VecDeque<Box<dyn FnOnce() + Send>>,
}

impl MasterExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a task. Does not run it; call [`Self::drain`] (or
    /// [`Self::run_one`]) to execute queued tasks in FIFO order.
    pub fn submit(&mut self, task: impl FnOnce() + Send + 'static) {
        self.queue.push_back(Box::new(task));
    }

    /// Runs the oldest queued task, if any. Returns whether a task ran.
    pub fn run_one(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs every currently queued task, in FIFO order. Tasks submitted
    /// by a running task are also drained before returning, matching a
    /// real single-threaded event loop.
    pub fn drain(&mut self) {
        while self.run_one() {}
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Per-key ordering guarantee for the write executor: two tasks with the
/// same [`WriteKey`] observed by the same caller run in submission order;
/// tasks with different keys may interleave.
pub type WriteKey = u64;

/// Bounded, key-sharded task queue (spec §5: "bounded parallelism,
/// sharded by field-writer key to preserve per-field order"). Backed by
/// one `crossbeam_queue::ArrayQueue` per shard.
pub struct WriteExecutor {
    shards: Vec<ArrayQueue<Box<dyn FnOnce() + Send>>>,
}

/// Result of attempting to submit to a full shard.
pub enum SubmitResult {
    Accepted,
    Backpressure,
}

impl WriteExecutor {
    /// Creates an executor with `shard_count` independent bounded queues,
    /// each able to hold `capacity_per_shard` pending tasks.
    ///
    /// # Panics
    ///
    /// Panics if `shard_count` or `capacity_per_shard` is zero.
    pub fn new(shard_count: usize, capacity_per_shard: usize) -> Self {
        assert!(shard_count > 0, "shard_count must be positive");
        assert!(capacity_per_shard > 0, "capacity_per_shard must be positive");
        Self {
            shards: (0..shard_count).map(|_| ArrayQueue::new(capacity_per_shard)).collect(),
        }
    }

    fn shard_for(&self, key: WriteKey) -> usize {
        (key as usize) % self.shards.len()
    }

    /// Submits `task`, routed deterministically by `key` to the same
    /// shard every time so per-key order is preserved. Returns
    /// `Backpressure` instead of blocking when that shard's queue is
    /// full.
    pub fn submit(&self, key: WriteKey, task: impl FnOnce() + Send + 'static) -> SubmitResult {
        let shard = self.shard_for(key);
        match self.shards[shard].push(Box::new(task)) {
            Ok(()) => SubmitResult::Accepted,
            Err(_) => SubmitResult::Backpressure,
        }
    }

    /// Drains and runs every pending task across all shards. Tasks within
    /// one shard run in FIFO order; shards themselves are drained in
    /// index order here since this reference implementation has no real
    /// parallelism, but nothing downstream may rely on cross-shard
    /// ordering.
    pub fn drain(&self) {
        for shard in &self.shards {
            while let Some(task) = shard.pop() {
                task();
            }
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

/// Unordered work pool for tasks that tolerate arbitrary interleaving
/// (warmup, disk-index fusion, tensor-index updates, docstore writes).
/// Unlike [`WriteExecutor`] it has no notion of key-based ordering.
#[derive(Default)]
pub struct SharedExecutor {
    queue: ArrayQueueOrUnbounded,
}

/// Internal storage: bounded when a capacity is given at construction,
/// unbounded (a plain `Vec`-backed queue) otherwise. Kept private; the
/// public surface ([`SharedExecutor::submit`]) is the same either way.
enum ArrayQueueOrUnbounded {
    Bounded(ArrayQueue<Box<dyn FnOnce() + Send>>),
    Unbounded(std::sync::Mutex<VecDeque<Box<dyn FnOnce() + Send>>>),
}

impl Default for ArrayQueueOrUnbounded {
    fn default() -> Self {
        ArrayQueueOrUnbounded::Unbounded(std::sync::Mutex::new(VecDeque::new()))
    }
}

impl SharedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            queue: ArrayQueueOrUnbounded::Bounded(ArrayQueue::new(capacity)),
        }
    }

    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> SubmitResult {
        match &self.queue {
            ArrayQueueOrUnbounded::Bounded(q) => match q.push(Box::new(task)) {
                Ok(()) => SubmitResult::Accepted,
                Err(_) => SubmitResult::Backpressure,
            },
            ArrayQueueOrUnbounded::Unbounded(q) => {
                q.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push_back(Box::new(task));
                SubmitResult::Accepted
            }
        }
    }

    /// Runs every pending task, in no particular cross-submission order
    /// guarantee beyond "eventually all run."
    pub fn drain(&self) {
        match &self.queue {
            ArrayQueueOrUnbounded::Bounded(q) => {
                while let Some(task) = q.pop() {
                    task();
                }
            }
            ArrayQueueOrUnbounded::Unbounded(q) => {
                let mut guard = q.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                while let Some(task) = guard.pop_front() {
                    task();
                }
            }
        }
    }
}

/// Marker seam for the executor that owns RPC sockets. The serving-path
/// core defines only the contract ("never blocks on application work");
/// the concrete transport is an external collaborator (spec §1). Kept as
/// a trait so the dispatcher's fan-out (`vespa-dispatch::invoker`) can be
/// driven against a fake implementation in tests without a real network.
pub trait TransportExecutor {
    /// Submits outbound bytes for `target`; must return immediately,
    /// never waiting on a reply.
    fn send(&self, target: u32, payload: &[u8]) -> Result<(), crate::error::ServerError>;
}

/// A transport that records every send for inspection, used in tests and
/// simulations instead of a real socket.
#[derive(Default)]
pub struct RecordingTransport {
    sent: std::sync::Mutex<Vec<(u32, Vec<u8>)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(u32, Vec<u8>)> {
        self.sent.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl TransportExecutor for RecordingTransport {
    fn send(&self, target: u32, payload: &[u8]) -> Result<(), crate::error::ServerError> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((target, payload.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn master_executor_runs_in_submission_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut exec = MasterExecutor::new();
        for i in 0..5 {
            let order = Arc::clone(&order);
            exec.submit(move || order.lock().unwrap().push(i));
        }
        exec.drain();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn write_executor_same_key_same_shard() {
        let exec = WriteExecutor::new(4, 8);
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            assert!(matches!(exec.submit(42, move || { count.fetch_add(1, Ordering::SeqCst); }), SubmitResult::Accepted));
        }
        exec.drain();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn write_executor_shard_backpressure() {
        let exec = WriteExecutor::new(1, 1);
        assert!(matches!(exec.submit(0, || {}), SubmitResult::Accepted));
        assert!(matches!(exec.submit(0, || {}), SubmitResult::Backpressure));
        exec.drain();
    }

    #[test]
    fn shared_executor_drains_all_tasks() {
        let exec = SharedExecutor::bounded(4);
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let count = Arc::clone(&count);
            exec.submit(move || { count.fetch_add(1, Ordering::SeqCst); });
        }
        exec.drain();
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn recording_transport_captures_sends() {
        let transport = RecordingTransport::new();
        transport.send(7, b"hello").unwrap();
        assert_eq!(transport.sent(), vec![(7, b"hello".to_vec())]);
    }
}
