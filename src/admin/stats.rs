//! Statistics collection and reporting for a trained engine.

use serde::Serialize;

use crate::engine::RolexEngine;

/// Per-submodel occupancy used inside a [`StatsReport`].
#[derive(Debug, Clone, Serialize)]
pub struct SubmodelStats {
    /// Index of this submodel in the upper index.
    pub index: usize,
    /// Largest training key routed to this submodel (the upper index pivot).
    pub pivot_key: u64,
    /// Number of training keys this submodel was built with.
    pub capacity: usize,
    /// Number of primary leaf slots in this submodel's table.
    pub slots: usize,
    /// Number of synonym (overflow) leaves chained off any slot.
    pub synonym_leaves: usize,
    /// Synonym table capacity this submodel was built with.
    pub syn_max: usize,
}

/// Comprehensive statistics report for an engine instance, analogous to the
/// teacher's `admin::stats::StatsReport` for a database instance.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Total number of submodels in the upper index.
    pub submodels: usize,
    /// Number of leaves handed out so far.
    pub leaves_used: u64,
    /// Total preallocated leaf capacity.
    pub leaves_capacity: u64,
    /// Fraction of the leaf arena consumed, in `[0.0, 1.0]`.
    pub leaf_utilization: f64,
    /// Per-submodel occupancy.
    pub per_submodel: Vec<SubmodelStats>,
}

/// Builds a [`StatsReport`] for `engine`, in the style of the teacher's
/// `admin::stats::stats` function: a read-only walk of already-maintained
/// counters, safe to call at any time (search/scan take no locks, and this
/// function takes none of its own either — it only reads atomics).
pub fn stats<const N: usize>(engine: &RolexEngine<N>) -> StatsReport {
    let models = engine.models();
    let per_submodel = (0..models.len())
        .map(|i| {
            let sm = models.get(i);
            SubmodelStats {
                index: i,
                pivot_key: models.pivot_key(i),
                capacity: sm.capacity,
                slots: sm.table.len(),
                synonym_leaves: sm.table.synonym_used().saturating_sub(1),
                syn_max: sm.table.syn_max(),
            }
        })
        .collect();

    let leaves_used = engine.leaves_used();
    let leaves_capacity = engine.leaf_capacity();
    let leaf_utilization = if leaves_capacity == 0 {
        0.0
    } else {
        leaves_used as f64 / leaves_capacity as f64
    };

    StatsReport {
        submodels: engine.submodel_count(),
        leaves_used,
        leaves_capacity,
        leaf_utilization,
        per_submodel,
    }
}
