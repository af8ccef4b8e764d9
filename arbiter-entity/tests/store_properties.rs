//! Property-based tests for the entity store.
//!
//! - Deduplication: one entity per uid, last write wins, first position kept
//! - Identity: entity equality follows the uid alone
//! - Round trip: canonical records rebuild an equivalent store

use arbiter_entity::{Entity, EntityRecord, EntityStore, EntityUid, Value};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn uid_strategy() -> impl Strategy<Value = EntityUid> {
    (
        prop::sample::select(vec!["User", "Group", "Photos::Album"]),
        "[a-d]{1,2}",
    )
        .prop_map(|(ty, id)| EntityUid::new(ty, id).unwrap())
}

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Long),
        "[a-zA-Z0-9 \"\\\\]{0,12}".prop_map(Value::String),
        uid_strategy().prop_map(Value::Entity),
        "[0-9.]{1,8}".prop_map(|arg| Value::extension("ip", arg)),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Set),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Record),
        ]
    })
}

fn entity_strategy() -> impl Strategy<Value = Entity> {
    (
        uid_strategy(),
        prop::collection::btree_map("[a-z]{1,6}", value_strategy(), 0..4),
        prop::collection::vec(uid_strategy(), 0..3),
    )
        .prop_map(|(uid, attrs, parents)| Entity::new(uid, attrs, parents))
}

// =============================================================================
// DEDUPLICATION
// =============================================================================

proptest! {
    /// Every uid appears once and holds the attributes of its last occurrence.
    #[test]
    fn last_write_wins(input in prop::collection::vec(entity_strategy(), 0..20)) {
        let store = EntityStore::from_entities(input.clone(), None).unwrap();

        let mut last: BTreeMap<EntityUid, &Entity> = BTreeMap::new();
        let mut first_seen: Vec<EntityUid> = Vec::new();
        for entity in &input {
            if last.insert(entity.uid().clone(), entity).is_none() {
                first_seen.push(entity.uid().clone());
            }
        }

        prop_assert_eq!(store.len(), last.len());
        let order: Vec<EntityUid> = store.iter().map(|e| e.uid().clone()).collect();
        prop_assert_eq!(order, first_seen);
        for (uid, expected) in last {
            let stored = store.get(&uid).unwrap();
            prop_assert_eq!(stored.attrs(), expected.attrs());
            prop_assert_eq!(stored.parents(), expected.parents());
        }
    }

    /// Equality and hashing ignore everything but the uid.
    #[test]
    fn identity_follows_uid(a in entity_strategy(), b in entity_strategy()) {
        prop_assert_eq!(a == b, a.uid() == b.uid());
        let set: HashSet<Entity> = [a.clone(), b.clone()].into_iter().collect();
        prop_assert_eq!(set.len(), if a.uid() == b.uid() { 1 } else { 2 });
    }

    /// Building twice from the same input gives identical output.
    #[test]
    fn serialization_is_stable(input in prop::collection::vec(entity_strategy(), 0..10)) {
        let a = EntityStore::from_entities(input.clone(), None).unwrap();
        let b = EntityStore::from_entities(input, None).unwrap();
        prop_assert_eq!(a.to_json_string().unwrap(), b.to_json_string().unwrap());
    }
}

// =============================================================================
// ROUND TRIP
// =============================================================================

proptest! {
    #[test]
    fn records_rebuild_the_store(input in prop::collection::vec(entity_strategy(), 0..10)) {
        let store = EntityStore::from_entities(input, None).unwrap();
        let text = store.to_json_string().unwrap();
        let records: Vec<EntityRecord> = serde_json::from_str(&text).unwrap();
        let restored = EntityStore::from_records(records, None).unwrap();

        prop_assert_eq!(restored.len(), store.len());
        for (original, copy) in store.iter().zip(restored.iter()) {
            prop_assert_eq!(original.uid(), copy.uid());
            prop_assert_eq!(original.attrs(), copy.attrs());
            prop_assert_eq!(original.parents(), copy.parents());
        }
    }
}
