//! Shared test utilities.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Routes library `tracing` events to the test writer. Honors `RUST_LOG`;
/// safe to call from every test.
pub fn setup() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}
