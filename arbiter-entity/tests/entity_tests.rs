mod common;

use arbiter_entity::{Entity, EntityError, EntityLike, RawEntity, Value};
use common::{group, user, user_with_age};
use serde_json::json;
use std::collections::HashSet;

// ── Identity-only equality ───────────────────────────────────────

#[test]
fn same_uid_different_attrs_are_equal() {
    let a = user_with_age("alice", 30, &[]);
    let b = user_with_age("alice", 99, &[group("admins")]);
    assert_eq!(a, b);
}

#[test]
fn different_uids_are_not_equal() {
    let a = user_with_age("alice", 30, &[]);
    let b = user_with_age("bob", 30, &[]);
    assert_ne!(a, b);
}

#[test]
fn hash_set_keeps_one_entity_per_uid() {
    let set: HashSet<Entity> = [
        user_with_age("alice", 1, &[]),
        user_with_age("alice", 2, &[]),
        user_with_age("bob", 3, &[]),
    ]
    .into_iter()
    .collect();
    assert_eq!(set.len(), 2);
}

// ── Accessors ────────────────────────────────────────────────────

#[test]
fn accessors_expose_fields() {
    let e = Entity::new(
        user("alice"),
        [
            ("name", Value::from("Alice")),
            ("admin", Value::from(true)),
            ("manager", Value::from(user("bob"))),
        ],
        [group("staff")],
    );
    assert_eq!(e.uid(), &user("alice"));
    assert_eq!(e.attr("name").and_then(Value::as_str), Some("Alice"));
    assert_eq!(e.attr("admin").and_then(Value::as_bool), Some(true));
    assert_eq!(e.attr("manager").and_then(Value::as_entity), Some(&user("bob")));
    assert!(e.attr("missing").is_none());
    assert!(e.has_parent(&group("staff")));
    assert_eq!(e.parents().len(), 1);
}

#[test]
fn with_uid_has_nothing_else() {
    let e = Entity::with_uid(user("x"));
    assert!(e.attrs().is_empty());
    assert!(e.parents().is_empty());
}

// ── Raw records ──────────────────────────────────────────────────

#[test]
fn raw_entity_resolves_all_fields() {
    let raw = RawEntity::new("User::\"alice\"")
        .attr("age", 30)
        .attr("manager", json!({"__entity": {"type": "User", "id": "bob"}}))
        .attr("ip", json!({"__extn": {"fn": "ip", "arg": "10.0.0.1"}}))
        .attr("tags", json!(["a", "b"]))
        .parent(json!({"type": "Group", "id": "staff"}));

    let e = raw.into_entity(0).unwrap();
    assert_eq!(e.uid(), &user("alice"));
    assert_eq!(e.attr("age"), Some(&Value::Long(30)));
    assert_eq!(e.attr("manager"), Some(&Value::Entity(user("bob"))));
    assert_eq!(e.attr("ip"), Some(&Value::extension("ip", "10.0.0.1")));
    assert_eq!(e.attr("tags"), Some(&Value::set(["a", "b"])));
    assert!(e.has_parent(&group("staff")));
}

#[test]
fn raw_entity_without_uid_is_malformed() {
    let err = RawEntity::default().into_entity(4).unwrap_err();
    match err {
        EntityError::MalformedEntity { index, reason } => {
            assert_eq!(index, 4);
            assert!(reason.contains("uid"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn raw_entity_with_null_uid_is_malformed() {
    let raw = RawEntity::from_json(json!({"uid": null}), 0).unwrap();
    assert!(matches!(
        raw.into_entity(0),
        Err(EntityError::MalformedEntity { index: 0, .. })
    ));
}

#[test]
fn raw_entity_with_bad_uid_is_malformed() {
    let err = RawEntity::new("alice").into_entity(2).unwrap_err();
    assert!(matches!(err, EntityError::MalformedEntity { index: 2, .. }));
}

#[test]
fn raw_entity_with_non_object_attrs_is_malformed() {
    let err = RawEntity::from_json(json!({"uid": "User::\"a\"", "attrs": [1, 2]}), 3).unwrap_err();
    assert!(matches!(err, EntityError::MalformedEntity { index: 3, .. }));
}

#[test]
fn raw_entity_with_bad_parent_is_malformed() {
    let err = RawEntity::new("User::\"a\"")
        .parent(17)
        .into_entity(1)
        .unwrap_err();
    assert!(matches!(err, EntityError::MalformedEntity { index: 1, .. }));
}

#[test]
fn raw_entity_with_bad_escape_is_malformed() {
    let err = RawEntity::new("User::\"a\"")
        .attr("ip", json!({"__extn": {"fn": "ip"}}))
        .into_entity(0)
        .unwrap_err();
    assert!(err.to_string().contains("__extn"));
}

#[test]
fn raw_from_json_rejects_non_objects() {
    let err = RawEntity::from_json(json!("User::\"a\""), 5).unwrap_err();
    assert!(matches!(err, EntityError::MalformedEntity { index: 5, .. }));
}

#[test]
fn entity_like_resolves_built_entities_untouched() {
    let e = user_with_age("alice", 7, &[]);
    let resolved = EntityLike::from(e.clone()).resolve(0).unwrap();
    assert_eq!(resolved.attr("age"), Some(&Value::Long(7)));
}

// ── JSON value conversion ────────────────────────────────────────

#[test]
fn numbers_become_longs_or_floats() {
    assert_eq!(Value::from_json(&json!(3)).unwrap(), Value::Long(3));
    assert_eq!(Value::from_json(&json!(-3)).unwrap(), Value::Long(-3));
    assert_eq!(Value::from_json(&json!(1.5)).unwrap(), Value::Float(1.5));
    assert!(matches!(
        Value::from_json(&json!(u64::MAX)).unwrap(),
        Value::Float(_)
    ));
}

#[test]
fn objects_become_records_unless_escaped() {
    let v = Value::from_json(&json!({"city": "Paris", "zip": 75001})).unwrap();
    assert_eq!(
        v,
        Value::record([("city", Value::from("Paris")), ("zip", Value::from(75001))])
    );

    let two_keys = Value::from_json(&json!({"__entity": "User::\"a\"", "x": 1})).unwrap();
    assert!(matches!(two_keys, Value::Record(_)));
}

#[test]
fn null_is_kept_as_null() {
    assert_eq!(Value::from_json(&json!(null)).unwrap(), Value::Null);
}
