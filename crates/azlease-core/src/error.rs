//! Error types and result aliases for the lease engine.
//!
//! Two families live here:
//! - [`ValidationError`]: numeric and identity inputs rejected before any
//!   backend call is made.
//! - [`BackendError`]: anything the storage collaborator reports. Only the
//!   coarse [`BackendErrorKind`] is interpreted by the engine; the message is
//!   surfaced verbatim (minus double quotes) in the final result.

use std::fmt;

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Inputs rejected before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Lease duration outside `[15, 60]` seconds.
    #[error("lease duration must be between {min} and {max} seconds, got {value}")]
    LeaseDuration {
        /// Rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// Acquisition retry budget below one or above `u32::MAX`.
    #[error("retries must be between 1 and {}, got {value}", u32::MAX)]
    RetryCount {
        /// Rejected value.
        value: i64,
    },

    /// Acquisition inter-attempt wait outside `[0, 59]` seconds.
    #[error("acquire wait time must be between {min} and {max} seconds, got {value}")]
    AcquireWait {
        /// Rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// Renewal iteration count below one or above `u32::MAX`.
    #[error("iterations must be between 1 and {}, got {value}", u32::MAX)]
    IterationCount {
        /// Rejected value.
        value: i64,
    },

    /// Renewal inter-iteration wait outside `[1, 59]` seconds.
    #[error("renew wait time must be between {min} and {max} seconds, got {value}")]
    RenewWait {
        /// Rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// A required identifier was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the empty field.
        field: &'static str,
    },
}

/// Coarse classification of a backend failure.
///
/// The engine only branches on [`BackendErrorKind::NotFound`] (during
/// provisioning). Acquisition and renewal treat every kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The container or blob does not exist.
    NotFound,
    /// The lease is held by someone else, or the lease id does not match.
    Conflict,
    /// Transport, authorization, throttling or anything unclassified.
    Other,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A failure reported by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    /// Classification used for control flow.
    pub kind: BackendErrorKind,
    /// Raw error text from the backend.
    pub message: String,
}

impl BackendError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::NotFound,
            message: message.into(),
        }
    }

    /// Creates a lease conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Conflict,
            message: message.into(),
        }
    }

    /// Creates an unclassified error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Other,
            message: message.into(),
        }
    }

    /// Returns whether the resource was reported missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == BackendErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_displays_raw_message() {
        let err = BackendError::not_found("ContainerNotFound: The specified container does not exist.");
        assert_eq!(
            err.to_string(),
            "ContainerNotFound: The specified container does not exist."
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn conflict_is_not_not_found() {
        assert!(!BackendError::conflict("LeaseAlreadyPresent").is_not_found());
        assert!(!BackendError::other("timeout").is_not_found());
    }

    #[test]
    fn validation_error_messages_name_bounds() {
        let err = ValidationError::LeaseDuration {
            value: 14,
            min: 15,
            max: 60,
        };
        assert_eq!(
            err.to_string(),
            "lease duration must be between 15 and 60 seconds, got 14"
        );
    }
}
