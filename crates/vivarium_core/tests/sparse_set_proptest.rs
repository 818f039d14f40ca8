//! Property-based tests for sparse-set integrity.
//!
//! Random insert/remove sequences are replayed against a `BTreeMap` model;
//! after every operation the dense/sparse mapping must agree with the model.
//!
//! Run with: cargo test -p vivarium_core -- proptest

use std::collections::BTreeMap;

use proptest::prelude::*;
use vivarium_core::{EntityId, SparseSet, Transform, TransformStore, World};
use vivarium_shared::Vec3;

// =============================================================================
// Strategies
// =============================================================================

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, i64),
    Remove(u32),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..64u32, any::<i64>()).prop_map(|(e, v)| Op::Insert(e, v)),
        (0..64u32).prop_map(Op::Remove),
    ]
}

fn check_against_model(set: &SparseSet<i64>, model: &BTreeMap<u32, i64>) {
    assert_eq!(set.len(), model.len());
    assert_eq!(set.entities().len(), set.values().len());
    for (k, (entity, value)) in set.iter().enumerate() {
        assert_eq!(set.entities()[k], entity);
        assert_eq!(model.get(&entity.index()), Some(value));
    }
    for (&id, value) in model {
        assert_eq!(set.get(EntityId::from_raw(id)), Some(value));
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_sparse_set_matches_model(ops in prop::collection::vec(arb_op(), 0..256)) {
        let mut set = SparseSet::with_capacity(8);
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(e, v) => {
                    set.insert(EntityId::from_raw(e), v);
                    model.insert(e, v);
                }
                Op::Remove(e) => {
                    let got = set.remove(EntityId::from_raw(e));
                    prop_assert_eq!(got, model.remove(&e));
                }
            }
            check_against_model(&set, &model);
        }
    }

    #[test]
    fn proptest_transform_columns_stay_aligned(ops in prop::collection::vec(arb_op(), 0..128)) {
        let mut store = TransformStore::with_capacity(4);
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(e, v) => {
                    let x = (v % 1000) as f32;
                    store.insert(EntityId::from_raw(e), Transform::from_position(Vec3::new(x, 0.0, 0.0)));
                    model.insert(e, x);
                }
                Op::Remove(e) => {
                    prop_assert_eq!(store.remove(EntityId::from_raw(e)), model.remove(&e).is_some());
                }
            }
        }

        prop_assert_eq!(store.len(), model.len());
        for (&id, &x) in &model {
            let position = store.position(EntityId::from_raw(id));
            prop_assert_eq!(position, Some(Vec3::new(x, 0.0, 0.0)));
        }
    }

    #[test]
    fn proptest_world_recycles_only_dead_ids(kills in prop::collection::vec(any::<bool>(), 1..64)) {
        let mut world = World::new(8);
        let spawned: Vec<EntityId> = kills.iter().map(|_| world.create_entity()).collect();
        for (&entity, &kill) in spawned.iter().zip(&kills) {
            if kill {
                world.destroy_entity(entity);
            }
        }
        let dead = kills.iter().filter(|k| **k).count();
        for _ in 0..dead {
            let id = world.create_entity();
            prop_assert!((id.index() as usize) < spawned.len());
        }
        prop_assert_eq!(world.alive_count(), spawned.len());
    }
}
