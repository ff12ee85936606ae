//! Per-submodel leaf directory plus overflow chains (component C3).
//!
//! A [`LeafTable`] holds one packed [`TableEntry`] per leaf slot ("primary"
//! entries) plus a fixed-size synonym table used to chain overflow leaves
//! off a primary slot when it fills up. Every primary slot has an
//! independent spinlock; it is the only lock acquired on the mutation path
//! for insert/update/remove/split. Readers (search/range) take no locks at
//! all and instead scan the whole candidate chain, which tolerates
//! observing a chain mid-split (see module docs on [`crate::engine`]).

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::error::{Result, RolexError};
use crate::model::arena::LeafArena;

/// `SynonymTable[0]`'s role as the free-list header means index 0 is never
/// handed out as a real chain entry; a `synonym_head` of 0 means "chain
/// ends here".
const CHAIN_TERMINATOR: u8 = 0;

/// A minimal test-and-test-and-set spinlock, matching the design's "bounded,
/// short critical section" assumption: at most one arena allocation, two
/// array copies, and one chain-link update happen while held.
struct SpinLock(AtomicBool);

impl SpinLock {
    fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    fn lock(&self) {
        while self
            .0
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.0.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    fn unlock(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A packed 64-bit leaf-table entry: `{lock:1, leaf_region:7,
/// synonym_head:8, leaf_num:48}`, low bit first. The `lock` bit is carried
/// for wire-format fidelity with the source design but is never set: actual
/// mutual exclusion is provided by the table's parallel `locks` vector
/// (§3's "plus a parallel vector of spin locks"), not this bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry(u64);

const LEAF_NUM_BITS: u32 = 48;
const SYNONYM_HEAD_BITS: u32 = 8;
const LEAF_NUM_MASK: u64 = (1u64 << LEAF_NUM_BITS) - 1;
const SYNONYM_HEAD_SHIFT: u32 = LEAF_NUM_BITS;
const SYNONYM_HEAD_MASK: u64 = 0xFF;
const LEAF_REGION_SHIFT: u32 = LEAF_NUM_BITS + SYNONYM_HEAD_BITS;
const LEAF_REGION_MASK: u64 = 0x7F;

impl TableEntry {
    /// Builds an entry. `leaf_region` is reserved for future multi-region
    /// arenas and must be `0`; this is a checked setter per the design's
    /// "wrap it in a typed accessor with checked setters" note.
    pub fn new(leaf_num: u64, synonym_head: u8, leaf_region: u8) -> Self {
        assert!(leaf_num <= LEAF_NUM_MASK, "leaf_num exceeds 48 bits");
        assert_eq!(leaf_region, 0, "leaf_region is reserved and must be 0");
        let bits = leaf_num
            | ((synonym_head as u64) << SYNONYM_HEAD_SHIFT)
            | ((leaf_region as u64) << LEAF_REGION_SHIFT);
        Self(bits)
    }

    fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    fn bits(self) -> u64 {
        self.0
    }

    /// The primary leaf's index in the arena.
    pub fn leaf_num(self) -> u64 {
        self.0 & LEAF_NUM_MASK
    }

    /// Index of the head of this slot's synonym chain, or `0` for none.
    pub fn synonym_head(self) -> u8 {
        ((self.0 >> SYNONYM_HEAD_SHIFT) & SYNONYM_HEAD_MASK) as u8
    }

    /// Reserved region tag; always `0`.
    pub fn leaf_region(self) -> u8 {
        ((self.0 >> LEAF_REGION_SHIFT) & LEAF_REGION_MASK) as u8
    }
}

/// Per-submodel directory mapping dense leaf slots to a primary leaf and its
/// synonym (overflow) chain.
pub struct LeafTable {
    primary: Vec<AtomicU64>,
    locks: Vec<SpinLock>,
    synonym: Vec<AtomicU64>,
    /// Mirrors `SynonymTable[0].leaf_num`: the next free synonym index.
    /// Kept as a dedicated atomic (rather than overloading `synonym[0]`,
    /// which the spec's struct layout does) so the counter can be bumped
    /// without a data race even if two different slots split concurrently —
    /// the spec notes this is "monotonic" and needs no lock, which only
    /// holds if the increment itself is atomic.
    next_free: AtomicUsize,
    syn_max: usize,
}

impl LeafTable {
    /// Builds an empty table with a synonym table sized for `syn_max`
    /// entries (index 0 is the reserved free-list header).
    pub fn new(syn_max: usize) -> Self {
        assert!(syn_max >= 2, "syn_max must leave room for at least one synonym");
        Self {
            primary: Vec::new(),
            locks: Vec::new(),
            synonym: (0..syn_max).map(|_| AtomicU64::new(0)).collect(),
            next_free: AtomicUsize::new(1),
            syn_max,
        }
    }

    /// Appends a new primary slot pointing at `leaf_num`, with no synonym
    /// chain. Used only during training, before the table is shared across
    /// threads.
    pub fn train_push(&mut self, leaf_num: u64) -> usize {
        self.primary
            .push(AtomicU64::new(TableEntry::new(leaf_num, 0, 0).bits()));
        self.locks.push(SpinLock::new());
        self.primary.len() - 1
    }

    /// Number of primary slots.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    /// `true` if this table has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    fn get_entry(&self, slot: usize) -> TableEntry {
        TableEntry::from_bits(self.primary[slot].load(Ordering::Acquire))
    }

    fn set_primary_synonym_head(&self, slot: usize, head: u8) {
        let cur = self.get_entry(slot);
        let updated = TableEntry::new(cur.leaf_num(), head, cur.leaf_region());
        self.primary[slot].store(updated.bits(), Ordering::Release);
    }

    fn get_synonym(&self, idx: usize) -> TableEntry {
        TableEntry::from_bits(self.synonym[idx].load(Ordering::Acquire))
    }

    fn set_synonym_next(&self, idx: usize, next: u8) {
        let cur = self.get_synonym(idx);
        let updated = TableEntry::new(cur.leaf_num(), next, cur.leaf_region());
        self.synonym[idx].store(updated.bits(), Ordering::Release);
    }

    /// Number of synonym entries allocated so far (mirrors
    /// `SynonymTable[0].leaf_num`).
    pub fn synonym_used(&self) -> usize {
        self.next_free.load(Ordering::Acquire)
    }

    /// Configured synonym table capacity.
    pub fn syn_max(&self) -> usize {
        self.syn_max
    }

    fn alloc_synonym(&self, leaf_num: u64) -> Result<usize> {
        loop {
            let cur = self.next_free.load(Ordering::Acquire);
            if cur == self.syn_max - 1 {
                return Err(RolexError::SynonymExhausted);
            }
            if self
                .next_free
                .compare_exchange_weak(cur, cur + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.synonym[cur].store(
                    TableEntry::new(leaf_num, CHAIN_TERMINATOR, 0).bits(),
                    Ordering::Release,
                );
                return Ok(cur);
            }
        }
    }

    /// Synonym indices walked from `slot`'s head toward the terminator, in
    /// head-to-tail (ascending key) order.
    fn ascending_chain(&self, slot: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut idx = self.get_entry(slot).synonym_head();
        while idx != CHAIN_TERMINATOR {
            out.push(idx as usize);
            idx = self.get_synonym(idx as usize).synonym_head();
        }
        out
    }

    /// Leaf indices in the canonical traversal order: tail-to-head synonyms,
    /// then the primary (descending key-range priority; see spec §4.3).
    fn descending_chain_leaf_nums(&self, slot: usize) -> Vec<u64> {
        let mut out: Vec<u64> = self
            .ascending_chain(slot)
            .into_iter()
            .rev()
            .map(|idx| self.get_synonym(idx).leaf_num())
            .collect();
        out.push(self.get_entry(slot).leaf_num());
        out
    }

    /// The slot (within `[lo, hi]`) whose primary leaf is the best match for
    /// `k`: the highest-indexed slot in `(lo, hi]` whose primary leaf
    /// accepts `k`, or `lo` if none do.
    fn accepting_slot<const N: usize>(
        &self,
        k: u64,
        lo: usize,
        hi: usize,
        arena: &LeafArena<N>,
    ) -> usize {
        debug_assert!(hi < self.len(), "hi out of range for this table");
        for i in (lo + 1..=hi).rev() {
            let leaf_num = self.get_entry(i).leaf_num();
            if arena.get(leaf_num).read().accepts(k) {
                return i;
            }
        }
        lo
    }

    /// Finds the exact leaf within `slot`'s chain that owns `k`: the
    /// highest-priority (tail-most) leaf whose `accepts(k)` holds, falling
    /// back to the primary. Safe to call only while holding `slot`'s lock —
    /// lock-free callers (search/range) use [`LeafTable::descending_chain_leaf_nums`]
    /// and scan the whole chain instead, which tolerates concurrent splits.
    fn find_owner_leaf<const N: usize>(&self, k: u64, slot: usize, arena: &LeafArena<N>) -> u64 {
        for idx in self.ascending_chain(slot).into_iter().rev() {
            let leaf_num = self.get_synonym(idx).leaf_num();
            if arena.get(leaf_num).read().accepts(k) {
                return leaf_num;
            }
        }
        self.get_entry(slot).leaf_num()
    }

    /// Point lookup across `[lo, hi]`. Lock-free: scans the whole candidate
    /// chain rather than pinpointing a single owner leaf, so a concurrent
    /// split is always safely observed one way or the other.
    pub fn search<const N: usize>(
        &self,
        k: u64,
        lo: usize,
        hi: usize,
        arena: &LeafArena<N>,
    ) -> Option<u64> {
        let slot = self.accepting_slot(k, lo, hi, arena);
        for leaf_num in self.descending_chain_leaf_nums(slot) {
            if let Some(v) = arena.get(leaf_num).read().search(k) {
                return Some(v);
            }
        }
        None
    }

    /// Overwrites an existing key's value. Returns `false` if absent.
    pub fn update<const N: usize>(
        &self,
        k: u64,
        v: u64,
        lo: usize,
        hi: usize,
        arena: &LeafArena<N>,
    ) -> bool {
        let slot = self.accepting_slot(k, lo, hi, arena);
        self.locks[slot].lock();
        let owner = self.find_owner_leaf(k, slot, arena);
        let result = arena.get(owner).write().update(k, v);
        self.locks[slot].unlock();
        result
    }

    /// Inserts `(k, v)`. Returns `Ok(false)` for a duplicate key, `Ok(true)`
    /// on success, and `Err` when a split was required but the synonym
    /// table or leaf arena is exhausted — both signal a retraining need.
    pub fn insert<const N: usize>(
        &self,
        k: u64,
        v: u64,
        lo: usize,
        hi: usize,
        arena: &LeafArena<N>,
    ) -> Result<bool> {
        let slot = self.accepting_slot(k, lo, hi, arena);
        if self.next_free.load(Ordering::Acquire) == self.syn_max - 1 {
            return Err(RolexError::SynonymExhausted);
        }
        self.locks[slot].lock();
        let result = self.insert_locked(k, v, slot, arena);
        self.locks[slot].unlock();
        result
    }

    fn insert_locked<const N: usize>(
        &self,
        k: u64,
        v: u64,
        slot: usize,
        arena: &LeafArena<N>,
    ) -> Result<bool> {
        let mut owner = self.find_owner_leaf(k, slot, arena);
        if arena.get(owner).read().contains(k) {
            return Ok(false);
        }
        if arena.get(owner).read().is_full() {
            if self.next_free.load(Ordering::Acquire) == self.syn_max - 1 {
                return Err(RolexError::SynonymExhausted);
            }
            let new_leaf_num = arena.fetch_new_leaf()?;
            {
                let mut donor = arena.get(owner).write();
                let mut fresh = arena.get(new_leaf_num).write();
                split_leaf(&mut donor, &mut fresh);
            }
            self.link_new_synonym(slot, owner, new_leaf_num)?;
            if arena.get(new_leaf_num).read().accepts(k) {
                owner = new_leaf_num;
            }
        }
        arena.get(owner).write().insert_not_full(k, v);
        Ok(true)
    }

    fn find_synonym_index(&self, slot: usize, leaf_num: u64) -> Option<usize> {
        self.ascending_chain(slot)
            .into_iter()
            .find(|&idx| self.get_synonym(idx).leaf_num() == leaf_num)
    }

    /// Splices `new_leaf_num` into `slot`'s chain immediately "in front of"
    /// `owner_leaf_num` in traversal priority: if `owner` is the primary,
    /// the new synonym becomes the chain head; otherwise it is spliced
    /// between `owner` and whatever followed it.
    fn link_new_synonym(&self, slot: usize, owner_leaf_num: u64, new_leaf_num: u64) -> Result<()> {
        let syn_idx = self.alloc_synonym(new_leaf_num)?;
        let primary = self.get_entry(slot);
        if primary.leaf_num() == owner_leaf_num {
            let old_head = primary.synonym_head();
            self.set_synonym_next(syn_idx, old_head);
            self.set_primary_synonym_head(slot, syn_idx as u8);
        } else {
            let owner_idx = self
                .find_synonym_index(slot, owner_leaf_num)
                .expect("owner leaf must be reachable from slot's chain");
            let old_next = self.get_synonym(owner_idx).synonym_head();
            self.set_synonym_next(syn_idx, old_next);
            self.set_synonym_next(owner_idx, syn_idx as u8);
        }
        Ok(())
    }

    /// Removes `k` if present. If its leaf becomes empty and it was a
    /// synonym leaf, unlinks it from the chain (the arena slot itself is
    /// never reclaimed). The primary leaf is never unlinked.
    pub fn remove<const N: usize>(
        &self,
        k: u64,
        lo: usize,
        hi: usize,
        arena: &LeafArena<N>,
    ) -> bool {
        let slot = self.accepting_slot(k, lo, hi, arena);
        self.locks[slot].lock();
        let owner = self.find_owner_leaf(k, slot, arena);
        let removed = arena.get(owner).write().remove(k);
        if removed {
            let primary_leaf_num = self.get_entry(slot).leaf_num();
            if owner != primary_leaf_num && arena.get(owner).read().is_empty() {
                self.unlink_synonym(slot, owner);
            }
        }
        self.locks[slot].unlock();
        removed
    }

    fn unlink_synonym(&self, slot: usize, owner_leaf_num: u64) {
        let mut prev: Option<usize> = None;
        let mut idx = self.get_entry(slot).synonym_head();
        while idx != CHAIN_TERMINATOR {
            let entry = self.get_synonym(idx as usize);
            if entry.leaf_num() == owner_leaf_num {
                let next = entry.synonym_head();
                match prev {
                    None => self.set_primary_synonym_head(slot, next),
                    Some(p) => self.set_synonym_next(p, next),
                }
                return;
            }
            prev = Some(idx as usize);
            idx = entry.synonym_head();
        }
    }

    /// Forward range scan starting at `k`, across `[lo, hi]` and onward
    /// through later slots until `n` pairs are collected.
    pub fn range<const N: usize>(
        &self,
        k: u64,
        n: usize,
        lo: usize,
        hi: usize,
        arena: &LeafArena<N>,
    ) -> Vec<(u64, u64)> {
        let mut out = Vec::new();
        if n == 0 {
            return out;
        }
        let slot = self.accepting_slot(k, lo, hi, arena);
        self.range_from_owner(k, n, slot, arena, &mut out);
        let mut idx = slot + 1;
        while out.len() < n && idx < self.len() {
            let leaf_num = self.get_entry(idx).leaf_num();
            arena.get(leaf_num).read().range(k, n, &mut out);
            if out.len() < n {
                self.range_ascending_chain(k, n, idx, arena, &mut out);
            }
            idx += 1;
        }
        out
    }

    fn range_from_owner<const N: usize>(
        &self,
        k: u64,
        n: usize,
        slot: usize,
        arena: &LeafArena<N>,
        out: &mut Vec<(u64, u64)>,
    ) {
        let primary_leaf_num = self.get_entry(slot).leaf_num();
        let owner = self.find_owner_leaf(k, slot, arena);
        arena.get(owner).read().range(k, n, out);
        if out.len() >= n {
            return;
        }
        let chain = self.ascending_chain(slot);
        let start = if owner == primary_leaf_num {
            0
        } else {
            let pos = chain
                .iter()
                .position(|&idx| self.get_synonym(idx).leaf_num() == owner)
                .expect("owner must be in chain when not primary");
            pos + 1
        };
        for &idx in &chain[start.min(chain.len())..] {
            if out.len() >= n {
                return;
            }
            arena
                .get(self.get_synonym(idx).leaf_num())
                .read()
                .range(k, n, out);
        }
    }

    fn range_ascending_chain<const N: usize>(
        &self,
        k: u64,
        n: usize,
        slot: usize,
        arena: &LeafArena<N>,
        out: &mut Vec<(u64, u64)>,
    ) {
        for idx in self.ascending_chain(slot) {
            if out.len() >= n {
                return;
            }
            arena
                .get(self.get_synonym(idx).leaf_num())
                .read()
                .range(k, n, out);
        }
    }

    /// Primary leaf numbers for each slot in `[lo, hi]`, in slot order — the
    /// set of leaves a cache-resolved remote read would fetch for a
    /// predicted window, before following any synonym chains.
    pub fn primary_leaf_nums(&self, lo: usize, hi: usize) -> Vec<u64> {
        (lo..=hi.min(self.len().saturating_sub(1)))
            .map(|i| self.get_entry(i).leaf_num())
            .collect()
    }

    /// Synonym chain leaf numbers for `slot`, in tail-to-head traversal
    /// order (the order a reader should search them in).
    pub fn synonym_leaf_nums(&self, slot: usize) -> Vec<u64> {
        self.ascending_chain(slot)
            .into_iter()
            .rev()
            .map(|idx| self.get_synonym(idx).leaf_num())
            .collect()
    }

    /// Serializes as `entry_count: u32 | entries: [u64; entry_count] |
    /// synonym: [u64; syn_max]`, matching spec §4.5's ltable blob layout.
    /// `synonym[0]`'s `leaf_num` field is written as the free-list counter,
    /// preserving wire compatibility even though this implementation tracks
    /// that counter in a separate atomic internally.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.primary.len() * 8 + self.syn_max * 8);
        out.extend_from_slice(&(self.primary.len() as u32).to_le_bytes());
        for entry in &self.primary {
            out.extend_from_slice(&entry.load(Ordering::Acquire).to_le_bytes());
        }
        let header = TableEntry::new(self.synonym_used() as u64, 0, 0);
        out.extend_from_slice(&header.bits().to_le_bytes());
        for entry in self.synonym.iter().skip(1) {
            out.extend_from_slice(&entry.load(Ordering::Acquire).to_le_bytes());
        }
        out
    }

    /// Inverse of [`LeafTable::serialize`].
    pub fn deserialize(bytes: &[u8], syn_max: usize) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(RolexError::Decode("leaf table header truncated".into()));
        }
        let entry_count = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let expected = 4 + (entry_count + syn_max) * 8;
        if bytes.len() < expected {
            return Err(RolexError::Decode("leaf table body truncated".into()));
        }
        let mut primary = Vec::with_capacity(entry_count);
        let mut cursor = 4;
        for _ in 0..entry_count {
            let bits = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
            primary.push(AtomicU64::new(bits));
            cursor += 8;
        }
        let locks = (0..entry_count).map(|_| SpinLock::new()).collect();
        let mut synonym = Vec::with_capacity(syn_max);
        let header_bits = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
        let next_free = TableEntry::from_bits(header_bits).leaf_num() as usize;
        cursor += 8;
        synonym.push(AtomicU64::new(0));
        for _ in 1..syn_max {
            let bits = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
            synonym.push(AtomicU64::new(bits));
            cursor += 8;
        }
        Ok(Self {
            primary,
            locks,
            synonym,
            next_free: AtomicUsize::new(next_free),
            syn_max,
        })
    }
}

/// Splits a full leaf: moves its upper half (`N/2..N`) into `fresh`,
/// clearing the moved keys in `donor` back to `K_INVALID`. Keeps the
/// primary/older leaf aligned with the smaller keys, matching the
/// training-time assumption that later overflow leaves carry later keys.
fn split_leaf<const N: usize>(
    donor: &mut crate::model::leaf::Leaf<N>,
    fresh: &mut crate::model::leaf::Leaf<N>,
) {
    debug_assert!(donor.is_full());
    let mid = N / 2;
    for i in mid..N {
        let (k, v) = donor.take_slot(i);
        fresh.insert_not_full(k, v);
    }
}
