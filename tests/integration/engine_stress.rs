//! Seeded randomized stress test, complementing the proptest-driven
//! invariant coverage in `engine_mutations.rs` with a single large,
//! reproducible mutation sequence checked against a reference model.
#![allow(clippy::field_reassign_with_default)]

use std::collections::BTreeMap;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rolex::admin::verify;
use rolex::{RolexConfig, RolexEngine};

const TRAINING_KEY_COUNT: u64 = 400;
const OP_COUNT: usize = 5_000;
const SEED: u64 = 0x5eed_c0de;

#[test]
fn randomized_mutation_sequence_matches_a_reference_model() {
    let keys: Vec<u64> = (0..TRAINING_KEY_COUNT).map(|i| i * 10).collect();
    let vals: Vec<u64> = keys.clone();
    let config = RolexConfig {
        epsilon: 4,
        syn_max: 512,
        upper_reserved: 8192,
        leaf_capacity: 8192,
    };
    let engine: RolexEngine<8> = RolexEngine::train(&keys, &vals, config);

    let mut reference: BTreeMap<u64, u64> = keys.iter().copied().zip(vals.iter().copied()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);

    for _ in 0..OP_COUNT {
        let key = rng.gen_range(0..TRAINING_KEY_COUNT * 10);
        match rng.gen_range(0..4) {
            0 => {
                let val = rng.gen();
                if engine.insert(key, val).is_ok() {
                    reference.insert(key, val);
                }
            }
            1 => {
                let removed = engine.remove(key);
                assert_eq!(removed, reference.remove(&key).is_some());
            }
            2 => {
                let val = rng.gen();
                let updated = engine.update(key, val);
                assert_eq!(updated, reference.contains_key(&key));
                if updated {
                    reference.insert(key, val);
                }
            }
            _ => {
                assert_eq!(engine.search(key), reference.get(&key).copied());
            }
        }
    }

    for (&key, &val) in &reference {
        assert_eq!(engine.search(key), Some(val));
    }

    let report = verify(&engine);
    assert!(report.success, "verify found violations: {:?}", report.findings);
}
