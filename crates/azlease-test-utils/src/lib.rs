//! Shared test utilities for azlease integration tests.
//!
//! This crate provides:
//! - [`ScriptedBackend`]: lease backend with scripted responses and operation recording
//! - [`RecordingPause`]: pause that returns immediately and remembers each request
//! - Fixture helpers for lease targets
//!
//! # Example
//!
//! ```rust,ignore
//! use azlease_test_utils::{ScriptedBackend, RecordingPause, test_target};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let backend = ScriptedBackend::new();
//!     backend.script_acquire_failures(2, "LeaseAlreadyPresent");
//!     // ... run acquirer ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod pause;
pub mod scripted;

pub use fixtures::*;
pub use pause::*;
pub use scripted::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("azlease=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
