//! Wire-format round-trip coverage across every layer (leaf, leaf table,
//! model arena, whole engine) at sizes that force multiple leaves, a
//! synonym chain, and more than one submodel.

use rolex::model::{Leaf, LeafArena, ModelArena};
use rolex::{RolexConfig, RolexEngine};

#[test]
fn leaf_arena_round_trips_with_several_leaves() {
    let arena = LeafArena::<4>::new(8);
    for i in 0..5u64 {
        let num = arena.fetch_new_leaf().unwrap();
        arena.get(num).write().insert_not_full(i * 10, i);
    }
    let bytes = arena.serialize();
    let restored = LeafArena::<4>::deserialize(&bytes).unwrap();
    assert_eq!(restored.used(), arena.used());
    for i in 0..5u64 {
        assert_eq!(
            restored.get(i).read().search(i * 10),
            arena.get(i).read().search(i * 10)
        );
    }
}

#[test]
fn engine_round_trip_preserves_multiple_submodels_and_chains() {
    let keys: Vec<u64> = (0..200).map(|i| i * 3).collect();
    let vals: Vec<u64> = keys.iter().map(|k| k + 1).collect();
    let config = RolexConfig {
        epsilon: 4,
        syn_max: 32,
        upper_reserved: 8192,
        leaf_capacity: 256,
    };
    let engine: RolexEngine<16> = RolexEngine::train(&keys, &vals, config);
    for k in [601u64, 602, 603, 604, 605] {
        engine.insert(k, k * 100).unwrap();
    }

    let bytes = engine.serialize().unwrap();
    let restored = RolexEngine::<16>::deserialize(&bytes).unwrap();

    assert_eq!(restored.submodel_count(), engine.submodel_count());
    assert_eq!(restored.leaves_used(), engine.leaves_used());
    for (&k, &v) in keys.iter().zip(vals.iter()) {
        assert_eq!(restored.search(k), Some(v));
    }
    for k in [601u64, 602, 603, 604, 605] {
        assert_eq!(restored.search(k), engine.search(k));
    }
}

#[test]
fn engine_deserialize_rejects_a_truncated_header() {
    let err = RolexEngine::<4>::deserialize(&[0u8; 10]).unwrap_err();
    assert!(matches!(err, rolex::RolexError::Decode(_)));
}

#[test]
fn model_arena_rejects_a_truncated_prefix() {
    let err = ModelArena::<4>::deserialize(&[0u8; 4], 256, 8).unwrap_err();
    assert!(matches!(err, rolex::RolexError::Decode(_)));
}

#[test]
fn leaf_encoded_len_matches_serialized_output_exactly() {
    let mut leaf = Leaf::<8>::new();
    leaf.insert_not_full(1, 2);
    let mut bytes = Vec::new();
    leaf.serialize_into(&mut bytes);
    assert_eq!(bytes.len(), Leaf::<8>::encoded_len());
}

#[test]
fn engine_persists_to_disk_and_reloads_byte_identical() {
    let keys: Vec<u64> = (1..=8).map(|i| i * 10).collect();
    let vals = keys.clone();
    let config = RolexConfig {
        epsilon: 2,
        syn_max: 16,
        upper_reserved: 4096,
        leaf_capacity: 64,
    };
    let engine: RolexEngine<4> = RolexEngine::train(&keys, &vals, config);

    let file = tempfile::NamedTempFile::new().unwrap();
    let bytes = engine.serialize().unwrap();
    std::fs::write(file.path(), &bytes).unwrap();

    let reloaded_bytes = std::fs::read(file.path()).unwrap();
    let restored = RolexEngine::<4>::deserialize(&reloaded_bytes).unwrap();
    for k in keys {
        assert_eq!(restored.search(k), engine.search(k));
    }
}
