//! Construction-time tuning knobs.
//!
//! `N` (leaf array capacity) is a compile-time `const` generic on
//! [`crate::model::leaf::Leaf`] and the engine, since it determines the
//! on-wire layout of a leaf. The remaining knobs don't affect layout and are
//! ordinary runtime fields here, with the design's documented defaults.

/// PLR error bound, synonym table cap, and upper-index reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolexConfig {
    /// Piecewise-linear-regression error bound, in keys. Larger values
    /// produce fewer, wider submodels.
    pub epsilon: usize,
    /// Per-submodel synonym table capacity. Index 0 is the free-list header,
    /// so at most `syn_max - 1` overflow leaves are ever chained off one
    /// slot before a retrain is signaled.
    pub syn_max: usize,
    /// Byte size reserved for the upper index prefix of the model arena.
    pub upper_reserved: usize,
    /// Total number of leaf slots to preallocate in the leaf arena.
    pub leaf_capacity: usize,
}

impl Default for RolexConfig {
    fn default() -> Self {
        Self {
            epsilon: 32,
            syn_max: 128,
            upper_reserved: 32 * 1024 * 1024,
            leaf_capacity: 1 << 20,
        }
    }
}

impl RolexConfig {
    /// Returns the maximum number of submodels the upper index's reserved
    /// prefix can address: each submodel contributes one `u64` key entry and
    /// one `u64` offset entry, stored in the two halves of the prefix.
    pub fn max_submodels(&self) -> usize {
        (self.upper_reserved / 2) / std::mem::size_of::<u64>()
    }
}
