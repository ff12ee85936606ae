//! Compute-node replica of the upper index and submodels (component C7).
//!
//! A [`LearnedCache`] is built once, at client startup, from the bytes a
//! memory node's [`crate::engine::RolexEngine::serialize`] produced (in
//! production this would be a remote read of the live model arena rather
//! than a local byte slice, but the parsing is identical either way — see
//! spec §4.7 steps 1-3). Once built, a client resolves a key to
//! `(submodel, [lo, hi])` entirely locally and would issue one-sided RDMA
//! reads of just the implicated leaves; this crate models that boundary by
//! exposing [`LearnedCache::resolve`] and [`LearnedCache::candidate_leaves`]
//! without performing the actual remote read (out of scope per spec §1).

use crate::config::RolexConfig;
use crate::error::Result;
use crate::model::model_arena::ModelArena;

/// A read-only mirror of a memory node's upper index and submodels.
///
/// Carries no leaf data of its own — leaves live only in the memory node's
/// [`crate::model::arena::LeafArena`]; this cache only ever resolves a key
/// to the set of leaf indices that might hold it.
pub struct LearnedCache<const N: usize> {
    models: ModelArena<N>,
    config: RolexConfig,
}

impl<const N: usize> LearnedCache<N> {
    /// Builds a cache from a serialized model arena (spec §4.5 layout),
    /// exactly as a compute node would after reading `num_models`, the two
    /// parallel pivot/offset arrays, and then each submodel body from the
    /// remote memory node.
    pub fn from_model_arena_bytes(bytes: &[u8], config: RolexConfig) -> Result<Self> {
        let models = ModelArena::<N>::deserialize(bytes, config.upper_reserved, config.syn_max)?;
        Ok(Self { models, config })
    }

    /// Resolves `k` to its submodel index and predicted `[lo, hi]` leaf-slot
    /// window, purely from the local mirror — no round trip to the memory
    /// node. Returns `None` if the cache holds no submodels yet.
    pub fn resolve(&self, k: u64) -> Option<(usize, usize, usize)> {
        if self.models.is_empty() {
            return None;
        }
        let idx = self.models.model_for_key(k);
        let sm = self.models.get(idx);
        let (lo, hi) = sm.predict_slots(k, self.config.epsilon);
        Some((idx, lo, hi))
    }

    /// The primary leaf numbers a remote read would need to fetch for `k`:
    /// one per slot in the resolved `[lo, hi]` window. Synonym chains are
    /// deliberately consulted by every caller of this cache (unlike the
    /// original source's `search_asyn`, which skipped them on the
    /// compute-side remote-read path — spec §9 mandates chain traversal on
    /// every path, so this returns only primary leaf numbers and callers are
    /// expected to also resolve synonym chains via
    /// [`LearnedCache::synonym_chain`]).
    pub fn candidate_leaves(&self, k: u64) -> Vec<u64> {
        let Some((idx, lo, hi)) = self.resolve(k) else {
            return Vec::new();
        };
        let sm = self.models.get(idx);
        sm.table.primary_leaf_nums(lo, hi)
    }

    /// Synonym chain leaf numbers for slot `slot` of submodel `idx`, in
    /// traversal order (tail-to-head), for a caller that also wants to
    /// follow overflow chains without a second round trip.
    pub fn synonym_chain(&self, idx: usize, slot: usize) -> Vec<u64> {
        self.models.get(idx).table.synonym_leaf_nums(slot)
    }

    /// Byte offset of leaf `num` within the remote leaf arena, per spec
    /// §4.7: `16 + num * sizeof(Leaf)`.
    pub fn leaf_offset(num: u64) -> u64 {
        16 + num * crate::model::leaf::Leaf::<N>::encoded_len() as u64
    }

    pub fn submodel_count(&self) -> usize {
        self.models.len()
    }
}
