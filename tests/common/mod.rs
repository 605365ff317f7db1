//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod faulty_store;

/// Routes `tracing` output through the test harness so it shows up on failure.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
