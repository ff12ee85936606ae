//! Black-box coverage of the per-submodel leaf directory (C3) from outside
//! the crate, exercising the same scenarios the inline unit tests cover but
//! through the fully public surface a downstream integrator would use.

use rolex::model::{LeafArena, LeafTable};

fn build_table<const N: usize>(arena: &LeafArena<N>, keys: &[u64]) -> LeafTable {
    let mut table = LeafTable::new(8);
    let mut leaf_num = arena.fetch_new_leaf().unwrap();
    table.train_push(leaf_num);
    for &k in keys {
        if arena.get(leaf_num).read().is_full() {
            leaf_num = arena.fetch_new_leaf().unwrap();
            table.train_push(leaf_num);
        }
        arena.get(leaf_num).write().insert_not_full(k, k * 10);
    }
    table
}

#[test]
fn primary_leaf_nums_lists_one_per_slot() {
    let arena = LeafArena::<4>::new(8);
    let table = build_table(&arena, &[10, 20, 30, 40, 50, 60, 70, 80]);
    let nums = table.primary_leaf_nums(0, table.len() - 1);
    assert_eq!(nums.len(), table.len());
}

#[test]
fn synonym_leaf_nums_empty_before_any_split() {
    let arena = LeafArena::<4>::new(8);
    let table = build_table(&arena, &[10, 20, 30]);
    assert!(table.synonym_leaf_nums(0).is_empty());
}

#[test]
fn synonym_leaf_nums_grows_after_a_split() {
    let arena = LeafArena::<4>::new(16);
    let table = build_table(&arena, &[10, 20, 30, 40]);
    let hi = table.len() - 1;
    table.insert(15, 150, 0, hi, &arena).unwrap();
    table.insert(16, 160, 0, hi, &arena).unwrap();
    assert!(!table.synonym_leaf_nums(0).is_empty());
}

#[test]
fn leaf_table_round_trips_through_the_wire_format() {
    let arena = LeafArena::<4>::new(16);
    let table = build_table(&arena, &[10, 20, 30, 40, 50, 60, 70, 80]);
    let hi = table.len() - 1;
    table.insert(15, 150, 0, hi, &arena).unwrap();

    let bytes = table.serialize();
    let restored = LeafTable::deserialize(&bytes, table.syn_max()).unwrap();
    assert_eq!(restored.len(), table.len());
    assert_eq!(restored.synonym_used(), table.synonym_used());
    assert_eq!(
        restored.search(15, 0, hi, &arena),
        table.search(15, 0, hi, &arena)
    );
}

#[test]
fn deserialize_rejects_truncated_header() {
    let err = LeafTable::deserialize(&[0u8; 2], 8).unwrap_err();
    assert!(matches!(err, rolex::RolexError::Decode(_)));
}
