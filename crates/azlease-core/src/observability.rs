//! Observability infrastructure.
//!
//! Structured logging through `tracing`. Logs always go to stderr: stdout is
//! reserved for the single JSON result of an invocation.

use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::result::Operation;
use crate::target::LeaseTarget;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs.
    Json,
    /// Human-readable logs.
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Safe to call multiple times; subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `azlease_core=debug`).
///   Defaults to `default_level` when unset or invalid.
pub fn init_logging(format: LogFormat, default_level: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        fmt::layer()
                            .with_target(false)
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
        }
    });
}

/// Creates a span for one lease operation with the target's coordinates.
///
/// # Example
///
/// ```rust
/// use azlease_core::observability::lease_span;
/// use azlease_core::result::Operation;
/// use azlease_core::target::{AccountCoordinates, LeaseTarget};
///
/// let account = AccountCoordinates::new("sub", "rg", "acct").unwrap();
/// let target = LeaseTarget::new(account, "leases", "blob").unwrap();
/// let span = lease_span(Operation::Acquire, &target);
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn lease_span(operation: Operation, target: &LeaseTarget) -> Span {
    tracing::info_span!(
        "lease",
        op = operation.as_str(),
        account = target.account().account_name(),
        container = target.container(),
        blob = target.blob(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::AccountCoordinates;

    #[test]
    fn test_init_logging_succeeds() {
        init_logging(LogFormat::Pretty, "warn");
        init_logging(LogFormat::Json, "warn");
    }

    #[test]
    fn test_lease_span_creates_span() {
        let account = AccountCoordinates::new("sub", "rg", "acct").unwrap();
        let target = LeaseTarget::new(account, "leases", "blob").unwrap();
        let span = lease_span(Operation::Renew, &target);
        let _guard = span.enter();
        tracing::info!("renew message in span");
    }
}
