//! Training and read-path coverage for [`rolex::RolexEngine`] at a scale
//! that forces more than one submodel, exercising the upper index's routing
//! alongside each submodel's own predicted window.

use rolex::{RolexConfig, RolexEngine};

fn config(epsilon: usize) -> RolexConfig {
    RolexConfig {
        epsilon,
        syn_max: 32,
        upper_reserved: 8192,
        leaf_capacity: 256,
    }
}

#[test]
fn training_set_with_a_sharp_bend_yields_multiple_submodels() {
    // Two clearly distinct linear trends should force the PLR builder to
    // close more than one segment for a tight epsilon.
    let mut keys: Vec<u64> = (0..50).map(|i| i * 2).collect();
    let bend_start = keys.last().copied().unwrap() + 1000;
    keys.extend((0..50).map(|i| bend_start + i * 50));
    let vals = keys.clone();

    let engine: RolexEngine<8> = RolexEngine::train(&keys, &vals, config(1));
    assert!(engine.submodel_count() >= 2);

    for &k in &keys {
        assert_eq!(engine.search(k), Some(k));
    }
}

#[test]
fn search_is_consistent_across_every_submodel_boundary() {
    let keys: Vec<u64> = (0..200).map(|i| i * 3).collect();
    let vals: Vec<u64> = keys.iter().map(|k| k + 1).collect();
    let engine: RolexEngine<16> = RolexEngine::train(&keys, &vals, config(4));

    for (&k, &v) in keys.iter().zip(vals.iter()) {
        assert_eq!(engine.search(k), Some(v));
    }
    // Keys never trained on, including ones between every pair of trained
    // keys, must report absent rather than a neighbor's value.
    for k in [1u64, 2, 4, 5, 599] {
        assert_eq!(engine.search(k), None);
    }
}

#[test]
fn leaf_occupancy_matches_training_set_size() {
    let keys: Vec<u64> = (0..40).map(|i| i * 10).collect();
    let vals = keys.clone();
    let engine: RolexEngine<8> = RolexEngine::train(&keys, &vals, config(2));
    // 40 keys at leaf capacity 8 need at least 5 leaves.
    assert!(engine.leaves_used() >= 5);
    assert!(engine.leaves_used() <= engine.leaf_capacity());
}

#[test]
fn single_key_training_set_searches_and_scans() {
    let engine: RolexEngine<4> = RolexEngine::train(&[42], &[420], config(8));
    assert_eq!(engine.search(42), Some(420));
    assert_eq!(engine.search(41), None);
    assert_eq!(engine.scan(0, 10), vec![420]);
}
