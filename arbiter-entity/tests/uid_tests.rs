use arbiter_entity::{EntityError, EntityUid};
use serde_json::json;

// ── Parsing & display ────────────────────────────────────────────

#[test]
fn parse_simple_uid() {
    let uid = EntityUid::parse(r#"User::"alice""#).unwrap();
    assert_eq!(uid.type_name(), "User");
    assert_eq!(uid.id(), "alice");
    assert_eq!(uid.to_string(), r#"User::"alice""#);
}

#[test]
fn parse_namespaced_uid() {
    let uid: EntityUid = r#"Photos::Album::"trip-2024""#.parse().unwrap();
    assert_eq!(uid.type_name(), "Photos::Album");
    assert_eq!(uid.basename(), "Album");
    assert_eq!(uid.namespace(), "Photos");
    assert_eq!(uid.id(), "trip-2024");
}

#[test]
fn unqualified_type_has_empty_namespace() {
    let uid = EntityUid::new("User", "bob").unwrap();
    assert_eq!(uid.namespace(), "");
    assert_eq!(uid.basename(), "User");
}

#[test]
fn parse_trims_surrounding_whitespace() {
    let uid = EntityUid::parse("  User::\"alice\"\n").unwrap();
    assert_eq!(uid, EntityUid::new("User", "alice").unwrap());
}

#[test]
fn id_with_quotes_is_escaped_in_display() {
    let uid = EntityUid::new("User", "say \"hi\"").unwrap();
    assert_eq!(uid.to_string(), r#"User::"say \"hi\"""#);
    assert_eq!(EntityUid::parse(&uid.to_string()).unwrap(), uid);
}

#[test]
fn empty_id_is_allowed() {
    let uid = EntityUid::parse(r#"User::"""#).unwrap();
    assert_eq!(uid.id(), "");
}

// ── Rejections ───────────────────────────────────────────────────

#[test]
fn parse_rejects_missing_separator() {
    let err = EntityUid::parse("alice").unwrap_err();
    assert!(matches!(err, EntityError::InvalidUid { .. }));
}

#[test]
fn parse_rejects_bad_type_names() {
    for input in [r#"::"x""#, r#"1User::"x""#, r#"User::::"x""#, r#"Us-er::"x""#] {
        let err = EntityUid::parse(input).unwrap_err();
        assert!(
            matches!(err, EntityError::InvalidUid { .. }),
            "{input} should be rejected"
        );
    }
}

#[test]
fn parse_rejects_unterminated_id() {
    let err = EntityUid::parse(r#"User::"alice"#).unwrap_err();
    assert!(err.to_string().contains("unterminated"));
}

#[test]
fn parse_rejects_trailing_text() {
    let err = EntityUid::parse(r#"User::"alice"x"#).unwrap_err();
    assert!(err.to_string().contains("after closing quote"));
}

#[test]
fn new_rejects_invalid_type_name() {
    assert!(EntityUid::new("", "x").is_err());
    assert!(EntityUid::new("a b", "x").is_err());
}

// ── JSON shapes ──────────────────────────────────────────────────

#[test]
fn from_json_accepts_all_shapes() {
    let expected = EntityUid::new("User", "alice").unwrap();
    let shapes = [
        json!("User::\"alice\""),
        json!({"type": "User", "id": "alice"}),
        json!({"__entity": {"type": "User", "id": "alice"}}),
        json!({"__entity": "User::\"alice\""}),
    ];
    for shape in shapes {
        assert_eq!(EntityUid::from_json(&shape).unwrap(), expected, "{shape}");
    }
}

#[test]
fn from_json_rejects_other_shapes() {
    assert!(EntityUid::from_json(&json!(42)).is_err());
    assert!(EntityUid::from_json(&json!({"type": "User"})).is_err());
    assert!(EntityUid::from_json(&json!({"type": "User", "id": 7})).is_err());
}

#[test]
fn serializes_as_canonical_string() {
    let uid = EntityUid::new("Photos::Album", "a").unwrap();
    assert_eq!(serde_json::to_value(&uid).unwrap(), json!("Photos::Album::\"a\""));
}

#[test]
fn deserializes_from_object_form() {
    let uid: EntityUid = serde_json::from_value(json!({"type": "Group", "id": "admins"})).unwrap();
    assert_eq!(uid.to_string(), r#"Group::"admins""#);
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn uids_sort_by_type_then_id() {
    let mut uids = vec![
        EntityUid::new("User", "b").unwrap(),
        EntityUid::new("Group", "z").unwrap(),
        EntityUid::new("User", "a").unwrap(),
    ];
    uids.sort();
    let rendered: Vec<String> = uids.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![r#"Group::"z""#, r#"User::"a""#, r#"User::"b""#]
    );
}
