//! Cross-module behavioral coverage for the fixed-capacity leaf (C1),
//! beyond the inline unit tests in `rolex::model::leaf`.

use rolex::model::Leaf;

#[test]
fn accepts_rejects_keys_below_the_smallest() {
    let mut leaf = Leaf::<4>::new();
    leaf.insert_not_full(10, 100);
    leaf.insert_not_full(20, 200);
    assert!(leaf.accepts(10));
    assert!(leaf.accepts(15));
    assert!(!leaf.accepts(5));
}

#[test]
fn empty_leaf_accepts_nothing() {
    let leaf = Leaf::<4>::new();
    assert!(!leaf.accepts(0));
    assert!(!leaf.accepts(u64::MAX - 1));
}

#[test]
fn insert_update_remove_interleave_correctly() {
    let mut leaf = Leaf::<8>::new();
    for k in [40u64, 10, 30, 20] {
        leaf.insert_not_full(k, k * 10);
    }
    assert_eq!(leaf.occ(), 4);
    assert!(leaf.update(20, 999));
    assert_eq!(leaf.search(20), Some(999));
    assert!(leaf.remove(30));
    assert_eq!(leaf.occ(), 3);
    assert_eq!(leaf.search(30), None);
    // Remaining keys stay sorted after the removal shift.
    let mut out = Vec::new();
    leaf.range(0, 10, &mut out);
    assert_eq!(out, vec![(10, 100), (20, 999), (40, 400)]);
}

#[test]
fn full_leaf_round_trips_through_the_wire_format() {
    let mut leaf = Leaf::<4>::new();
    for k in [5u64, 15, 25, 35] {
        leaf.insert_not_full(k, k + 1);
    }
    let mut bytes = Vec::new();
    leaf.serialize_into(&mut bytes);
    assert_eq!(bytes.len(), Leaf::<4>::encoded_len());

    let restored = Leaf::<4>::deserialize_from(&bytes).unwrap();
    assert_eq!(restored.occ(), 4);
    for k in [5u64, 15, 25, 35] {
        assert_eq!(restored.search(k), leaf.search(k));
    }
}

#[test]
fn deserialize_rejects_truncated_bytes() {
    let err = Leaf::<4>::deserialize_from(&[0u8; 4]).unwrap_err();
    assert!(matches!(err, rolex::RolexError::Decode(_)));
}
