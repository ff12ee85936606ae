//! Structural invariant checker, the Rust-idiomatic analogue of the
//! original source's scattered `self_check()` debug helpers (see
//! `SPEC_FULL.md` §11.3): walks every submodel's leaf table checking the
//! testable properties of spec §8 (sorted leaf prefixes, chain finiteness
//! and acyclicity, and arena-bound containment) and reports any violation
//! rather than asserting — an operator runs this, it doesn't run itself.

use std::collections::HashSet;

use serde::Serialize;

use crate::engine::RolexEngine;
use crate::model::leaf::K_INVALID;

/// Severity of a single [`VerifyFinding`].
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    Warning,
    Error,
}

/// A single issue discovered during verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyFinding {
    pub severity: VerifySeverity,
    pub message: String,
}

impl VerifyFinding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }
}

/// Counts collected while walking the structure, independent of whether any
/// findings were raised.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyCounts {
    pub submodels: usize,
    pub slots: usize,
    pub leaves_visited: usize,
}

/// Complete report of a verification run.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub success: bool,
    pub findings: Vec<VerifyFinding>,
    pub counts: VerifyCounts,
}

/// Walks every submodel's leaf table, checking:
///
/// - **Leaf sorted prefix** (spec §8.1): each leaf's occupied prefix is
///   strictly increasing and the remainder is `K_INVALID`.
/// - **Chain finiteness & acyclicity** (spec §8.2): following a slot's
///   synonym chain terminates within `syn_max` steps with no repeated
///   index.
/// - **Arena bound** (spec §8.3): every `leaf_num` referenced is
///   `< arena.used()`.
pub fn verify<const N: usize>(engine: &RolexEngine<N>) -> VerifyReport {
    let mut findings = Vec::new();
    let mut counts = VerifyCounts::default();
    let models = engine.models();
    let arena = engine.arena();

    counts.submodels = models.len();
    for m in 0..models.len() {
        let sm = models.get(m);
        let table = &sm.table;
        counts.slots += table.len();

        for slot in 0..table.len() {
            let mut chain_leaves = table.primary_leaf_nums(slot, slot);
            chain_leaves.extend(table.synonym_leaf_nums(slot));

            // Acyclicity: synonym_leaf_nums already terminates via the
            // finite chain walk internally, but a corrupted chain could
            // still repeat an index without looping forever if the repeat
            // isn't the chain's own head; check explicitly here too.
            let mut seen = HashSet::new();
            for &leaf_num in &chain_leaves {
                if !seen.insert(leaf_num) {
                    findings.push(VerifyFinding::error(format!(
                        "submodel {m} slot {slot}: leaf {leaf_num} appears more than once in its chain"
                    )));
                }
            }

            for leaf_num in chain_leaves {
                counts.leaves_visited += 1;
                if leaf_num >= arena.used() {
                    findings.push(VerifyFinding::error(format!(
                        "submodel {m} slot {slot}: leaf_num {leaf_num} out of arena bounds (used={})",
                        arena.used()
                    )));
                    continue;
                }
                check_leaf_sorted_prefix(m, slot, leaf_num, arena, &mut findings);
            }
        }
    }

    VerifyReport {
        success: findings.is_empty(),
        findings,
        counts,
    }
}

fn check_leaf_sorted_prefix<const N: usize>(
    submodel: usize,
    slot: usize,
    leaf_num: u64,
    arena: &crate::model::LeafArena<N>,
    findings: &mut Vec<VerifyFinding>,
) {
    let leaf = arena.get(leaf_num).read();
    let occ = leaf.occ();
    let mut prev: Option<u64> = None;
    for i in 0..occ {
        let key = leaf.key_at(i);
        if key == K_INVALID {
            findings.push(VerifyFinding::error(format!(
                "submodel {submodel} slot {slot}: leaf {leaf_num} has K_INVALID inside its occupied prefix at index {i}"
            )));
            continue;
        }
        if let Some(p) = prev {
            if p >= key {
                findings.push(VerifyFinding::error(format!(
                    "submodel {submodel} slot {slot}: leaf {leaf_num} keys not strictly increasing at index {i}"
                )));
            }
        }
        prev = Some(key);
    }
    for i in occ..N {
        if leaf.key_at(i) != K_INVALID {
            findings.push(VerifyFinding::error(format!(
                "submodel {submodel} slot {slot}: leaf {leaf_num} has a non-invalid key past its occupied prefix at index {i}"
            )));
        }
    }
}
