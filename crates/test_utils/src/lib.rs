//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! expense-allocation test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for test data construction
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

use once_cell::sync::Lazy;

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
});

/// Initializes tracing once for the whole test binary
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
