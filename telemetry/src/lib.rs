//! Tracing initialization shared by binaries and tests.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

// Subscriber installation is global and fails when repeated, so both entry
// points funnel through a [`Once`]. Tests in particular call the init
// function once per test body.
static TRACING_INIT: Once = Once::new();

/// Default filter applied when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVES: &str = "info";

/// Initializes tracing for a long-lived process.
///
/// The filter is taken from `RUST_LOG` when present, falling back to
/// [`DEFAULT_DIRECTIVES`]. Subsequent calls are no-ops.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

        tracing_subscriber::fmt().with_env_filter(filter).init();

        tracing::info!(service_name, "tracing initialized");
    });
}

/// Initializes tracing for tests.
///
/// Identical to [`init_tracing`] except that output goes through the test
/// writer, so it is captured per test and only shown for failures. Safe to
/// call at the start of every test.
pub fn init_test_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
