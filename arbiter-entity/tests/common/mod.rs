//! Shared test helpers for entity tests.

#![allow(dead_code)]

use arbiter_entity::{Entity, EntityUid, Value};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Set `RUST_LOG=debug` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn uid(type_name: &str, id: &str) -> EntityUid {
    EntityUid::new(type_name, id).unwrap()
}

pub fn user(id: &str) -> EntityUid {
    uid("User", id)
}

pub fn group(id: &str) -> EntityUid {
    uid("Group", id)
}

/// A user with a single `age` attribute and the given parents.
pub fn user_with_age(id: &str, age: i64, parents: &[EntityUid]) -> Entity {
    Entity::new(
        user(id),
        [("age", Value::Long(age))],
        parents.iter().cloned(),
    )
}
