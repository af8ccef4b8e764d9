//! Shared test helpers for authorization tests.

#![allow(dead_code)]

use arbiter_authz::Request;
use arbiter_entity::EntityUid;
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

/// `User::"alice"` asking to view `Photo::"sky"`.
pub fn view_request() -> Request {
    Request::new(
        uid("User", "alice"),
        uid("Action", "view"),
        uid("Photo", "sky"),
    )
}

pub const POLICIES: &str = r#"@id("allow-view")
permit(principal, action == Action::"view", resource);
forbid(principal, action == Action::"delete", resource);"#;
