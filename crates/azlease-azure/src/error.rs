//! Error types for cloud resolution and token acquisition.

use std::path::PathBuf;

use azlease_core::BackendError;
use reqwest::StatusCode;

/// Cloud environment and custom cloud file errors.
#[derive(Debug, thiserror::Error)]
pub enum CloudConfigError {
    /// Environment name is not one of the known clouds.
    #[error("invalid cloud environment {0}")]
    UnknownEnvironment(String),

    /// A cloud file was given for a built-in cloud.
    #[error("custom cloud config file is only valid with environment CUSTOMCLOUD")]
    FileOnlyForCustom,

    /// `CUSTOMCLOUD` without a cloud file.
    #[error("environment CUSTOMCLOUD requires a custom cloud config file")]
    FileRequired,

    /// The cloud file does not exist.
    #[error("custom cloud config file {} not found", path.display())]
    FileNotFound {
        /// Path as given.
        path: PathBuf,
    },

    /// The cloud file could not be read.
    #[error("unable to read custom cloud config file {}: {source}", path.display())]
    Read {
        /// Path as given.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The cloud file is not valid JSON or lacks a required endpoint.
    #[error("invalid custom cloud config file {}: {message}", path.display())]
    Malformed {
        /// Path as given.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Token acquisition errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// A credential source is not configured in this environment.
    #[error("{source_name} unavailable: {message}")]
    Unavailable {
        /// Credential source name.
        source_name: &'static str,
        /// Reason.
        message: String,
    },

    /// The token endpoint rejected the request.
    #[error("{source_name} authentication failed ({status}): {body}")]
    Rejected {
        /// Credential source name.
        source_name: &'static str,
        /// HTTP status.
        status: StatusCode,
        /// Response body.
        body: String,
    },

    /// The token response could not be understood.
    #[error("{source_name} returned an invalid token response: {message}")]
    InvalidResponse {
        /// Credential source name.
        source_name: &'static str,
        /// Parser message.
        message: String,
    },

    /// Every source in the default chain failed.
    #[error("no credential source produced a token: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}

impl From<CredentialError> for BackendError {
    fn from(e: CredentialError) -> Self {
        BackendError::other(e.to_string())
    }
}

/// Maps a failed storage or management response onto the engine's error kinds.
///
/// HTTP 404 and any service code ending in `NotFound` are `NotFound`; 409 is
/// `Conflict`. The service code is kept at the front of the message.
pub(crate) fn classify(status: StatusCode, code: Option<&str>, detail: &str) -> BackendError {
    let message = match (code, detail.is_empty()) {
        (Some(code), false) => format!("{code} ({status}): {detail}"),
        (Some(code), true) => format!("{code} ({status})"),
        (None, false) => format!("API error ({status}): {detail}"),
        (None, true) => format!("API error ({status})"),
    };

    if status == StatusCode::NOT_FOUND || code.is_some_and(|c| c.ends_with("NotFound")) {
        BackendError::not_found(message)
    } else if status == StatusCode::CONFLICT {
        BackendError::conflict(message)
    } else {
        BackendError::other(message)
    }
}

/// Extracts the human message from a storage XML or management JSON error body.
pub(crate) fn error_detail(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ArmErrorResponse {
        error: ArmError,
    }

    #[derive(serde::Deserialize)]
    struct ArmError {
        message: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ArmErrorResponse>(body) {
        return parsed.error.message;
    }
    if let Some(start) = body.find("<Message>") {
        let rest = &body[start + "<Message>".len()..];
        if let Some(end) = rest.find("</Message>") {
            return rest[..end].lines().next().unwrap_or_default().trim().to_string();
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use azlease_core::BackendErrorKind;

    #[test]
    fn not_found_by_status_or_code() {
        let by_status = classify(StatusCode::NOT_FOUND, None, "");
        assert_eq!(by_status.kind, BackendErrorKind::NotFound);

        let by_code = classify(StatusCode::BAD_REQUEST, Some("ContainerNotFound"), "gone");
        assert_eq!(by_code.kind, BackendErrorKind::NotFound);
        assert!(by_code.message.starts_with("ContainerNotFound"));
    }

    #[test]
    fn conflict_and_other() {
        let conflict = classify(StatusCode::CONFLICT, Some("LeaseAlreadyPresent"), "");
        assert_eq!(conflict.kind, BackendErrorKind::Conflict);
        assert_eq!(conflict.message, "LeaseAlreadyPresent (409 Conflict)");

        let other = classify(StatusCode::FORBIDDEN, Some("AuthorizationFailure"), "denied");
        assert_eq!(other.kind, BackendErrorKind::Other);
    }

    #[test]
    fn detail_from_storage_xml() {
        let body = "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>LeaseAlreadyPresent</Code><Message>There is already a lease present.\nRequestId:abc\nTime:2024</Message></Error>";
        assert_eq!(error_detail(body), "There is already a lease present.");
    }

    #[test]
    fn detail_from_arm_json() {
        let body = r#"{"error":{"code":"ResourceNotFound","message":"The Resource was not found."}}"#;
        assert_eq!(error_detail(body), "The Resource was not found.");
    }

    #[test]
    fn chain_error_lists_every_source() {
        let err = CredentialError::Exhausted(vec!["a failed".into(), "b failed".into()]);
        assert_eq!(
            err.to_string(),
            "no credential source produced a token: a failed; b failed"
        );
    }
}
