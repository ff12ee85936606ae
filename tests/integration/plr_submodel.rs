//! Cross-module coverage for the PLR builder (C4, training half) and the
//! submodel it feeds (C4, serving half), focused on the seam between them:
//! a submodel's predicted window must stay within the segment's own
//! epsilon bound for every key it was trained on.

use rolex::model::plr::PlrBuilder;
use rolex::model::{LeafArena, LeafTable, LinearModel, SubModel};

#[test]
fn plr_segments_cover_every_trained_key_within_epsilon() {
    let keys: Vec<u64> = (0..64).map(|i| i * 7).collect();
    let epsilon = 4usize;
    let mut plr = PlrBuilder::new(epsilon);
    let mut segments = Vec::new();
    let mut start = 0usize;
    for (i, &k) in keys.iter().enumerate() {
        if let Some(seg) = plr.add_point(k, i as i64) {
            segments.push((seg, start, i));
            start = i;
        }
    }
    if let Some(seg) = plr.finish() {
        segments.push((seg, start, keys.len()));
    }

    for (seg, lo, hi) in &segments {
        for i in *lo..*hi {
            let predicted = (seg.slope * keys[i] as f64 + seg.intercept as f64) as i64;
            assert!(
                (predicted - i as i64).unsigned_abs() <= epsilon as u64,
                "segment prediction for rank {i} exceeded epsilon"
            );
        }
    }
}

#[test]
fn submodel_predicted_window_contains_every_trained_key() {
    let arena = LeafArena::<4>::new(16);
    let mut table = LeafTable::new(8);
    let keys: Vec<u64> = (0..12).map(|i| i * 10).collect();
    let mut leaf_num = arena.fetch_new_leaf().unwrap();
    table.train_push(leaf_num);
    for (i, &k) in keys.iter().enumerate() {
        if arena.get(leaf_num).read().is_full() {
            leaf_num = arena.fetch_new_leaf().unwrap();
            table.train_push(leaf_num);
        }
        arena.get(leaf_num).write().insert_not_full(k, i as u64);
    }

    // A perfectly linear fit: rank = key / 10.
    let model = LinearModel {
        slope: 0.1,
        intercept: 0.0,
    };
    let sm = SubModel::<4>::new(model, keys.len(), table);
    let epsilon = 2;
    for &k in &keys {
        assert_eq!(sm.search(k, epsilon, &arena), Some(keys.iter().position(|&x| x == k).unwrap() as u64));
    }
}

#[test]
fn submodel_window_widens_with_epsilon() {
    let arena = LeafArena::<4>::new(16);
    let mut table = LeafTable::new(8);
    table.train_push(arena.fetch_new_leaf().unwrap());
    table.train_push(arena.fetch_new_leaf().unwrap());
    table.train_push(arena.fetch_new_leaf().unwrap());

    let sm = SubModel::<4>::new(
        LinearModel {
            slope: 1.0,
            intercept: 0.0,
        },
        12,
        table,
    );
    let (lo_tight, hi_tight) = sm.predict_slots(4, 0);
    let (lo_wide, hi_wide) = sm.predict_slots(4, 4);
    assert!(hi_wide - lo_wide >= hi_tight - lo_tight);
}
