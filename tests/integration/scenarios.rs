//! The six concrete end-to-end scenarios named verbatim in the numbered
//! list: each trains on `keys = [10, 20, ..., 80]` with `N = 4`, `epsilon =
//! 2`, exactly as described.

use rolex::{RolexConfig, RolexEngine};

fn config() -> RolexConfig {
    RolexConfig {
        epsilon: 2,
        syn_max: 16,
        upper_reserved: 4096,
        leaf_capacity: 64,
    }
}

fn trained() -> RolexEngine<4> {
    let keys: Vec<u64> = (1..=8).map(|i| i * 10).collect();
    let vals = keys.clone();
    RolexEngine::train(&keys, &vals, config())
}

#[test]
fn scenario_1_pure_train_and_search() {
    let engine = trained();
    assert_eq!(engine.search(30), Some(30));
    assert_eq!(engine.search(25), None);
    assert_eq!(engine.search(80), Some(80));
}

#[test]
fn scenario_2_insert_without_split() {
    let engine = trained();
    engine.insert(55, 550).unwrap();
    assert_eq!(engine.search(55), Some(550));
    for k in (1..=8).map(|i| i * 10) {
        assert_eq!(engine.search(k), Some(k));
    }
}

#[test]
fn scenario_3_insert_forcing_split_grows_synonym_chain() {
    let engine = trained();
    for k in [11u64, 12, 13, 14, 15] {
        engine.insert(k, k).unwrap();
    }
    assert_eq!(engine.search(15), Some(15));
    assert_eq!(engine.search(10), Some(10));
}

#[test]
fn scenario_4_update_then_remove() {
    let engine = trained();
    assert!(engine.update(40, 4000));
    assert_eq!(engine.search(40), Some(4000));
    assert!(engine.remove(40));
    assert_eq!(engine.search(40), None);
    assert!(!engine.remove(40));
}

#[test]
fn scenario_5_range_scan_crossing_leaves() {
    let engine = trained();
    assert_eq!(engine.scan(25, 4), vec![30, 40, 50, 60]);
}

#[test]
fn scenario_6_round_trip_after_scenarios_2_and_3() {
    let engine = trained();
    engine.insert(55, 550).unwrap();
    for k in [11u64, 12, 13, 14, 15] {
        engine.insert(k, k).unwrap();
    }

    let bytes = engine.serialize().unwrap();
    let restored = RolexEngine::<4>::deserialize(&bytes).unwrap();

    let observed_keys = (1..=8)
        .map(|i| i * 10)
        .chain([55, 11, 12, 13, 14, 15]);
    for k in observed_keys {
        assert_eq!(restored.search(k), engine.search(k));
    }
}

#[test]
fn invariant_insert_then_duplicate_insert_is_a_no_op() {
    let engine = trained();
    engine.insert(15, 150).unwrap();
    assert!(engine.insert(15, 999).is_err());
    assert_eq!(engine.search(15), Some(150));
}

#[test]
fn invariant_insert_then_remove_then_search_is_absent() {
    let engine = trained();
    engine.insert(15, 150).unwrap();
    assert!(engine.remove(15));
    assert_eq!(engine.search(15), None);
}

#[test]
fn invariant_update_twice_keeps_the_latest_value() {
    let engine = trained();
    assert!(engine.update(40, 4000));
    assert!(engine.update(40, 4001));
    assert_eq!(engine.search(40), Some(4001));
}

#[test]
fn boundary_scan_with_n_zero_returns_empty_immediately() {
    let engine = trained();
    assert!(engine.scan(10, 0).is_empty());
}

#[test]
fn boundary_scan_past_every_key_returns_empty() {
    let engine = trained();
    assert!(engine.scan(10_000, 5).is_empty());
}

#[test]
fn boundary_single_training_key_submodel_uses_primary_leaf_only() {
    let engine: RolexEngine<4> = RolexEngine::train(&[7], &[70], config());
    assert_eq!(engine.search(7), Some(70));
    assert_eq!(engine.submodel_count(), 1);
}
