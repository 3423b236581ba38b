//! Test utilities for modep
//!
//! Helpers shared by the unit tests and the `tests/integration` suite:
//!
//! - [`init_test_logging`] - route `tracing` output through the test writer
//! - [`FakeDepTool`] - scripted [`DepTool`](crate::tool::DepTool) that counts its calls
//! - [`ScopeFixture`] - source files in a temporary directory plus the matching scope
//!
//! # Example
//!
//! ```rust,no_run
//! use modep_cli::test_utils::{FakeDepTool, ScopeFixture};
//!
//! let fixture = ScopeFixture::new().implementation("a").implementation("b");
//! let tool = FakeDepTool::new().output(fixture.path("a.ml"), "a.ml: b");
//! let scope = fixture.scope();
//! assert_eq!(scope.len(), 2);
//! ```

mod fake_tool;
mod fixtures;

pub use fake_tool::FakeDepTool;
pub use fixtures::ScopeFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set that level is used,
/// otherwise `RUST_LOG` decides, and without either nothing is logged.
///
/// ```bash
/// RUST_LOG=resolver=trace,build=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
