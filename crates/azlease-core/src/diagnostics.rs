//! Per-iteration renewal diagnostics.
//!
//! Diagnostics are a side channel for operators: one line per successful
//! renewal. They never carry the final outcome, which is always the single
//! [`OperationResult`](crate::result::OperationResult).

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use crate::target::LeaseToken;

/// One successful renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalDiagnostic {
    /// Zero-based iteration index.
    pub iteration: u32,
    /// Lease id confirmed by the backend.
    pub lease_id: LeaseToken,
    /// Backend request id.
    pub request_id: String,
}

impl fmt::Display for RenewalDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Renewed lease {}, iteration {}, request id {}",
            self.lease_id, self.iteration, self.request_id
        )
    }
}

/// Receives renewal diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Records one diagnostic.
    fn emit(&self, diagnostic: &RenewalDiagnostic);
}

/// Writes diagnostics as plain lines to stderr.
#[derive(Debug, Default)]
pub struct StderrDiagnostics;

impl DiagnosticSink for StderrDiagnostics {
    fn emit(&self, diagnostic: &RenewalDiagnostic) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{diagnostic}");
    }
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
    lines: Mutex<Vec<RenewalDiagnostic>>,
}

impl CollectedDiagnostics {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything emitted so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RenewalDiagnostic> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CollectedDiagnostics {
    fn emit(&self, diagnostic: &RenewalDiagnostic) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(diagnostic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_line_names_token_iteration_and_request() {
        let diagnostic = RenewalDiagnostic {
            iteration: 3,
            lease_id: "d3d63201-153b-453b-85ef-6c3bee3082f0".parse().unwrap(),
            request_id: "req-9".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "Renewed lease d3d63201-153b-453b-85ef-6c3bee3082f0, iteration 3, request id req-9"
        );
    }

    #[test]
    fn collected_diagnostics_keep_order() {
        let sink = CollectedDiagnostics::new();
        for iteration in 0..3 {
            sink.emit(&RenewalDiagnostic {
                iteration,
                lease_id: "t".parse().unwrap(),
                request_id: format!("r{iteration}"),
            });
        }
        let lines = sink.snapshot();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].request_id, "r2");
    }
}
