//! Content-addressed slab allocator for small and large arrays (spec §4.3).
//!
//! Type id 0 is the large-array type (one heap-allocated `Vec<T>` per
//! slot). Type ids `1..=max_small_array_size` map 1-to-1 to exact small
//! array sizes. An [`EntryRef`] is `(bufferId, offset)`; [`EntryRef::NULL`]
//! is the empty-array sentinel and never denotes a real slot.
//!
//! An append-only allocator: allocate one array at a time, compact by
//! copying live slots into a fresh buffer and rewriting roots.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use vespa_types::EntryRef;

/// Tuning knobs for buffer sizing and fragmentation avoidance (spec §4.3).
#[derive(Debug, Clone, Copy)]
pub struct ArrayStoreConfig {
    pub max_small_array_size: usize,
    pub huge_page_size: usize,
    pub small_page_size: usize,
    pub min_num_arrays_for_new_buffer: usize,
    /// Dead-fraction threshold above which a buffer is a compaction
    /// candidate.
    pub dead_fraction_threshold: f64,
}

impl Default for ArrayStoreConfig {
    fn default() -> Self {
        Self {
            max_small_array_size: 16,
            huge_page_size: 1 << 21, // 2 MiB
            small_page_size: 4096,
            min_num_arrays_for_new_buffer: 128,
            dead_fraction_threshold: 0.5,
        }
    }
}

const LARGE_ARRAY_TYPE_ID: u32 = 0;

struct Buffer<T> {
    type_id: u32,
    capacity: usize,
    slots: Vec<Option<Vec<T>>>,
    dead_count: usize,
    /// Set once a compaction pass drains this buffer to zero live entries.
    /// The slot stays in `ArrayStore::buffers` at a stable index (existing
    /// refs must keep resolving), but it no longer counts toward
    /// [`ArrayStore::buffer_count`] and is never handed out as an active
    /// buffer for new allocations of its type.
    retired: bool,
}

impl<T> Buffer<T> {
    fn new(type_id: u32, capacity: usize) -> Self {
        Self {
            type_id,
            capacity,
            slots: Vec::with_capacity(capacity),
            dead_count: 0,
            retired: false,
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    fn dead_fraction(&self) -> f64 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.dead_count as f64 / self.slots.len() as f64
        }
    }
}

/// Result of a [`ArrayStore::compact_worst`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    pub buffers_before: usize,
    pub buffers_after: usize,
    pub live_entries_copied: usize,
}

/// The rewrite table produced by compaction: every root-held ref must be
/// passed through [`CompactionContext::rewrite_root`] exactly once.
///
/// Roots are represented as `&AtomicU64` (the bit-packed form of an
/// [`EntryRef`], see [`EntryRef::to_bits`]) so the rewrite is a genuine
/// release-fenced store: any reader that observes the new value through
/// the same atomic also observes every write compaction made to reach it.
pub struct CompactionContext {
    mapping: HashMap<u64, u64>,
}

impl CompactionContext {
    pub fn rewrite_root(&self, root: &AtomicU64) {
        let old = root.load(Ordering::Acquire);
        if let Some(&new) = self.mapping.get(&old) {
            root.store(new, Ordering::Release);
        }
    }

    /// Number of refs this context knows how to rewrite.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// The array/attribute store.
pub struct ArrayStore<T: Clone> {
    config: ArrayStoreConfig,
    buffers: Vec<Buffer<T>>,
    /// `type_id -> buffer index` of the buffer currently accepting new
    /// allocations for that type.
    active_buffer: HashMap<u32, usize>,
    /// `type_id -> exact-size free slots` ready for immediate reuse (spec
    /// §4.3: "Allocation tries the free list first").
    free_lists: HashMap<u32, Vec<EntryRef>>,
    generation: u64,
}

impl<T: Clone> ArrayStore<T> {
    pub fn new(config: ArrayStoreConfig) -> Self {
        // Buffer id 0 is never handed out to a real allocation: `EntryRef`
        // packs `(0, 0)` as the null/empty-array sentinel (spec §4.3), so a
        // genuine first array at buffer 0, offset 0 would be indistinguishable
        // from null. Reserving index 0 with a permanently retired placeholder
        // buffer keeps every real `EntryRef` non-null without needing a
        // separate tag bit.
        let mut reserved = Buffer::new(LARGE_ARRAY_TYPE_ID, 0);
        reserved.retired = true;
        Self {
            config,
            buffers: vec![reserved],
            active_buffer: HashMap::new(),
            free_lists: HashMap::new(),
            generation: 0,
        }
    }

    fn type_id_for_len(&self, len: usize) -> u32 {
        if len == 0 || len > self.config.max_small_array_size {
            LARGE_ARRAY_TYPE_ID
        } else {
            len as u32
        }
    }

    fn buffer_capacity(&self, type_id: u32) -> usize {
        let elem_size = if type_id == LARGE_ARRAY_TYPE_ID {
            1
        } else {
            type_id as usize
        }
        .max(1);
        let by_huge_page = (self.config.huge_page_size / elem_size).max(1);
        let snapped = (by_huge_page / self.config.small_page_size).max(1) * self.config.small_page_size;
        snapped.max(self.config.min_num_arrays_for_new_buffer)
    }

    fn ensure_active_buffer(&mut self, type_id: u32) -> usize {
        if let Some(&idx) = self.active_buffer.get(&type_id) {
            if !self.buffers[idx].is_full() && !self.buffers[idx].retired {
                return idx;
            }
        }
        let capacity = self.buffer_capacity(type_id);
        self.buffers.push(Buffer::new(type_id, capacity));
        let idx = self.buffers.len() - 1;
        self.active_buffer.insert(type_id, idx);
        tracing::trace!(type_id, buffer = idx, capacity, "opened new array-store buffer");
        idx
    }

    /// Allocates storage for `array`, returning the [`EntryRef`] it can be
    /// read back through. An empty array returns [`EntryRef::NULL`]
    /// without touching any buffer.
    pub fn add(&mut self, array: Vec<T>) -> EntryRef {
        if array.is_empty() {
            return EntryRef::NULL;
        }
        let type_id = self.type_id_for_len(array.len());

        if let Some(free_ref) = self.free_lists.get_mut(&type_id).and_then(Vec::pop) {
            let buffer = &mut self.buffers[free_ref.buffer_id() as usize];
            buffer.slots[free_ref.offset() as usize] = Some(array);
            buffer.dead_count = buffer.dead_count.saturating_sub(1);
            return free_ref;
        }

        let idx = self.ensure_active_buffer(type_id);
        let buffer = &mut self.buffers[idx];
        let offset = buffer.slots.len() as u32;
        buffer.slots.push(Some(array));
        EntryRef::new(idx as u16, offset)
    }

    /// Reads the array at `entry_ref`. A null ref reads back as an empty
    /// slice (the sentinel); any other ref must have been returned by
    /// [`Self::add`] and not yet reclaimed by [`Self::reclaim`].
    pub fn get(&self, entry_ref: EntryRef) -> Option<&[T]> {
        if entry_ref.is_null() {
            return Some(&[]);
        }
        self.buffers
            .get(entry_ref.buffer_id() as usize)
            .and_then(|b| b.slots.get(entry_ref.offset() as usize))
            .and_then(|slot| slot.as_deref())
    }

    /// Marks `entry_ref` as logically removed. The slot's contents remain
    /// readable (spec §4.3: "A removed ref is held (not freed) until every
    /// reader generation observed at removal time has drained") until a
    /// later [`Self::reclaim`] call observes that no active reader could
    /// still be looking at it.
    pub fn remove(&mut self, entry_ref: EntryRef) {
        if entry_ref.is_null() {
            return;
        }
        if let Some(buffer) = self.buffers.get_mut(entry_ref.buffer_id() as usize) {
            buffer.dead_count += 1;
        }
    }

    /// Actually frees a previously-[`Self::remove`]d slot, making it
    /// available to the free list. The caller is responsible for knowing
    /// no reader generation active at removal time is still running; this
    /// split mirrors the generation-fenced reclamation the spec requires
    /// without this crate needing to own the reader-generation tracker
    /// itself (that lives with the document DB's master executor, spec
    /// §4.2/§5).
    pub fn reclaim(&mut self, entry_ref: EntryRef) {
        if entry_ref.is_null() {
            return;
        }
        if let Some(buffer) = self.buffers.get_mut(entry_ref.buffer_id() as usize) {
            if let Some(slot) = buffer.slots.get_mut(entry_ref.offset() as usize) {
                if slot.take().is_some() {
                    self.free_lists
                        .entry(buffer.type_id)
                        .or_default()
                        .push(entry_ref);
                }
            }
        }
    }

    /// Selects buffers whose dead fraction exceeds
    /// [`ArrayStoreConfig::dead_fraction_threshold`] and compacts their
    /// live entries into fresh buffers, returning a [`CompactionContext`]
    /// the caller must walk every pointer root through exactly once (spec
    /// §4.3 / testable property 4).
    pub fn compact_worst(&mut self) -> (CompactionContext, CompactionStats) {
        let buffers_before = self.buffer_count();
        let mut mapping = HashMap::new();
        let mut live_entries_copied = 0;

        let candidates: Vec<usize> = self
            .buffers
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.retired && b.dead_fraction() >= self.config.dead_fraction_threshold)
            .map(|(i, _)| i)
            .collect();

        for old_idx in candidates {
            let type_id = self.buffers[old_idx].type_id;
            let capacity = self.buffer_capacity(type_id);
            let mut new_buffer = Buffer::new(type_id, capacity);

            let old_slots = std::mem::take(&mut self.buffers[old_idx].slots);
            for (old_offset, slot) in old_slots.into_iter().enumerate() {
                if let Some(array) = slot {
                    let new_offset = new_buffer.slots.len() as u32;
                    new_buffer.slots.push(Some(array));
                    let old_ref = EntryRef::new(old_idx as u16, old_offset as u32);
                    let new_ref = EntryRef::new(old_idx as u16, new_offset);
                    // Same buffer id, rewritten offset: compaction here
                    // compacts in place within the same slab rather than
                    // relocating to a new buffer id, keeping `buffers`
                    // append-only and ids stable.
                    mapping.insert(old_ref.to_bits(), new_ref.to_bits());
                    live_entries_copied += 1;
                }
            }

            // A buffer drained to zero live entries is retired rather than
            // kept around empty: it still occupies its index (any ref still
            // pointing at it resolves through the rewrite above, never
            // directly), but no longer counts as an existing buffer and is
            // never reused as an active target for new allocations.
            if new_buffer.slots.is_empty() {
                new_buffer.retired = true;
                self.active_buffer.remove(&type_id);
            } else {
                self.active_buffer.insert(type_id, old_idx);
            }
            self.buffers[old_idx] = new_buffer;
            self.free_lists.remove(&type_id);
        }

        self.generation += 1;
        (
            CompactionContext { mapping },
            CompactionStats {
                buffers_before,
                buffers_after: self.buffer_count(),
                live_entries_copied,
            },
        )
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of buffers still considered to exist, i.e. not retired by a
    /// compaction pass that drained them to zero live entries.
    pub fn buffer_count(&self) -> usize {
        self.buffers.iter().filter(|b| !b.retired).count()
    }
}
