//! Shared test helpers for policy tests.

#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Set `RUST_LOG=debug` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const HAPPY_POLICY: &str = r#"@description("Happy user can see blue sky")
permit (
  principal == User::"happy",
  action,
  resource == Photo::"blue_sky"
);
"#;

pub const TWO_POLICIES: &str = r#"@description("alice views")
permit (principal == User::"alice", action == Action::"view", resource);

@description("no deletes")
forbid (principal, action == Action::"delete", resource)
when { resource.locked };
"#;
