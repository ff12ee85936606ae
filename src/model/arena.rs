//! Bump-allocated, index-addressable pool of leaves (component C2).
//!
//! The arena is shared between the memory node (which mutates it) and, in
//! spirit, compute-node replicas (which would read it one-sidedly over
//! RDMA; see [`crate::cache`]). It never frees a leaf once allocated: the
//! `used` counter only grows for the lifetime of the process.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{Result, RolexError};
use crate::model::leaf::Leaf;

/// Append-only pool of `Leaf<N>` slots, addressable by a dense `u64` index
/// (the design reserves 48 bits for this index in the packed leaf-table
/// entry; `u64` is used here since Rust has no native 48-bit integer and
/// the extra bits are simply never populated).
pub struct LeafArena<const N: usize> {
    used: AtomicU64,
    capacity: u64,
    leaves: Box<[RwLock<Leaf<N>>]>,
}

impl<const N: usize> LeafArena<N> {
    /// Preallocates `capacity` zero-initialised (all-`K_INVALID`) leaves.
    pub fn new(capacity: usize) -> Self {
        let leaves = (0..capacity)
            .map(|_| RwLock::new(Leaf::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            used: AtomicU64::new(0),
            capacity: capacity as u64,
            leaves,
        }
    }

    /// Number of leaves handed out so far.
    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    /// Total preallocated capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Atomically claims the next free leaf slot, returning its index.
    ///
    /// Fails with [`RolexError::Capacity`] once the arena is exhausted; the
    /// caller (an insert that needed to split) surfaces this to its client
    /// as a hard failure that signals retraining or reprovisioning.
    pub fn fetch_new_leaf(&self) -> Result<u64> {
        let mut cur = self.used.load(Ordering::Acquire);
        loop {
            if cur >= self.capacity {
                return Err(RolexError::Capacity);
            }
            match self.used.compare_exchange_weak(
                cur,
                cur + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(cur),
                Err(observed) => cur = observed,
            }
        }
    }

    /// Returns the lock guarding leaf `num`. Callers take a read lock for
    /// lookups/scans and a write lock when mutating (insert/update/remove,
    /// or moving half a leaf's entries during a split). Panics if
    /// `num >= used()`, matching the design's "unchecked in hot paths, must
    /// satisfy `i < used`" contract — a leaf_num that failed this bound
    /// would indicate a corrupted leaf table.
    pub fn get(&self, num: u64) -> &RwLock<Leaf<N>> {
        &self.leaves[num as usize]
    }

    /// Serializes every leaf in `[0, used)` in index order: `used: u64`,
    /// `capacity: u64`, then each leaf's keys followed by vals, all
    /// little-endian. Leaves beyond `used` are never written — they hold no
    /// meaningful data and would only bloat the arena file.
    pub fn serialize(&self) -> Vec<u8> {
        let used = self.used() as usize;
        let mut out = Vec::with_capacity(16 + used * N * 16);
        out.extend_from_slice(&(used as u64).to_le_bytes());
        out.extend_from_slice(&self.capacity.to_le_bytes());
        for i in 0..used {
            let leaf = self.leaves[i].read();
            leaf.serialize_into(&mut out);
        }
        out
    }

    /// Inverse of [`LeafArena::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 16 {
            return Err(RolexError::Decode("leaf arena header truncated".into()));
        }
        let used = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        let capacity = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let leaf_size = Leaf::<N>::encoded_len();
        let expected = 16 + used as usize * leaf_size;
        if bytes.len() < expected {
            return Err(RolexError::Decode("leaf arena body truncated".into()));
        }
        let mut leaves = Vec::with_capacity(capacity as usize);
        let mut cursor = 16;
        for _ in 0..used {
            let leaf = Leaf::<N>::deserialize_from(&bytes[cursor..cursor + leaf_size])?;
            leaves.push(RwLock::new(leaf));
            cursor += leaf_size;
        }
        for _ in used..capacity {
            leaves.push(RwLock::new(Leaf::new()));
        }
        Ok(Self {
            used: AtomicU64::new(used),
            capacity,
            leaves: leaves.into_boxed_slice(),
        })
    }
}
