//! One piecewise-linear segment plus its leaf directory (component C4).

use crate::error::Result;
use crate::model::arena::LeafArena;
use crate::model::leaf_table::LeafTable;

/// A single learned linear predictor: `pos = floor(slope * key + intercept)`.
///
/// The intercept is always expressed relative to the owning submodel's own
/// training range, so `pos` is a *local* position in `[0, capacity)` rather
/// than a global rank across the whole dataset — see
/// [`crate::model::plr`] and [`crate::engine`]'s training code for how the
/// global-rank segment produced by the PLR builder is rebased into this
/// local form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    /// Predicted local position for `k`. May be negative for keys well
    /// outside the segment's training range; callers clamp to `0` before
    /// using it as an index. Truncates toward zero, per design.
    pub fn predict_pos(&self, k: u64) -> i64 {
        (self.slope * k as f64 + self.intercept).trunc() as i64
    }
}

/// One PLR segment plus the leaf table holding its training data and any
/// inserts since.
pub struct SubModel<const N: usize> {
    pub model: LinearModel,
    /// Number of training keys assigned to this submodel.
    pub capacity: usize,
    pub table: LeafTable,
}

impl<const N: usize> SubModel<N> {
    pub fn new(model: LinearModel, capacity: usize, table: LeafTable) -> Self {
        Self {
            model,
            capacity,
            table,
        }
    }

    /// Computes the `[lo, hi]` *leaf-slot* window a key routes to: predicts a
    /// position, widens it by `epsilon` on each side (design: `lo = pos -
    /// epsilon`, `hi = pos + epsilon + 2`, clamped to `[0, capacity-1]`), then
    /// divides both ends by the leaf capacity `N` to get slot indices,
    /// clamped to the table's own slot range.
    pub fn predict_slots(&self, k: u64, epsilon: usize) -> (usize, usize) {
        let pos = self.model.predict_pos(k).max(0) as usize;
        let last = self.capacity.saturating_sub(1);
        let lo = pos.saturating_sub(epsilon).min(last);
        let hi = pos.saturating_add(epsilon).saturating_add(2).min(last);
        let lo = lo.min(hi);

        let last_slot = self.table.len().saturating_sub(1);
        let lo_slot = (lo / N).min(last_slot);
        let hi_slot = (hi / N).min(last_slot);
        let lo_slot = lo_slot.min(hi_slot);
        (lo_slot, hi_slot)
    }

    pub fn search(&self, k: u64, epsilon: usize, arena: &LeafArena<N>) -> Option<u64> {
        let (lo, hi) = self.predict_slots(k, epsilon);
        self.table.search(k, lo, hi, arena)
    }

    pub fn update(&self, k: u64, v: u64, epsilon: usize, arena: &LeafArena<N>) -> bool {
        let (lo, hi) = self.predict_slots(k, epsilon);
        self.table.update(k, v, lo, hi, arena)
    }

    pub fn insert(&self, k: u64, v: u64, epsilon: usize, arena: &LeafArena<N>) -> Result<bool> {
        let (lo, hi) = self.predict_slots(k, epsilon);
        self.table.insert(k, v, lo, hi, arena)
    }

    pub fn remove(&self, k: u64, epsilon: usize, arena: &LeafArena<N>) -> bool {
        let (lo, hi) = self.predict_slots(k, epsilon);
        self.table.remove(k, lo, hi, arena)
    }

    /// Forward range scan starting at `k`, bounded to this submodel's own
    /// table (callers spanning multiple submodels, e.g.
    /// [`crate::engine::RolexEngine::scan`], chain calls across submodels).
    pub fn range(&self, k: u64, n: usize, epsilon: usize, arena: &LeafArena<N>) -> Vec<(u64, u64)> {
        let (lo, hi) = self.predict_slots(k, epsilon);
        self.table.range(k, n, lo, hi, arena)
    }

    /// Scans this whole submodel from its very first key, used when a scan
    /// continues past this submodel's predecessor and needs every key it
    /// holds rather than ones starting at a particular key.
    pub fn range_from_start(&self, n: usize, arena: &LeafArena<N>) -> Vec<(u64, u64)> {
        let hi = self.table.len().saturating_sub(1);
        self.table.range(0, n, 0, hi, arena)
    }

    /// Serializes as `slope: f64 | intercept: f64 | capacity: u64 |
    /// ltable_len: u32 | ltable_blob`, matching spec §4.5.
    pub fn serialize(&self) -> Vec<u8> {
        let ltable = self.table.serialize();
        let mut out = Vec::with_capacity(8 + 8 + 8 + 4 + ltable.len());
        out.extend_from_slice(&self.model.slope.to_le_bytes());
        out.extend_from_slice(&self.model.intercept.to_le_bytes());
        out.extend_from_slice(&(self.capacity as u64).to_le_bytes());
        out.extend_from_slice(&(ltable.len() as u32).to_le_bytes());
        out.extend_from_slice(&ltable);
        out
    }

    /// Inverse of [`SubModel::serialize`].
    pub fn deserialize(bytes: &[u8], syn_max: usize) -> Result<Self> {
        use crate::error::RolexError;
        if bytes.len() < 28 {
            return Err(RolexError::Decode("submodel body truncated".into()));
        }
        let slope = f64::from_le_bytes(bytes[0..8].try_into().unwrap());
        let intercept = f64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let capacity = u64::from_le_bytes(bytes[16..24].try_into().unwrap()) as usize;
        let ltable_len = u32::from_le_bytes(bytes[24..28].try_into().unwrap()) as usize;
        if bytes.len() < 28 + ltable_len {
            return Err(RolexError::Decode("submodel leaf-table blob truncated".into()));
        }
        let table = LeafTable::deserialize(&bytes[28..28 + ltable_len], syn_max)?;
        Ok(Self {
            model: LinearModel { slope, intercept },
            capacity,
            table,
        })
    }
}
