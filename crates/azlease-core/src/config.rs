//! Engine configuration.
//!
//! Built once per invocation and passed to every component. Nothing in the
//! engine reads process-wide state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::target::DEFAULT_BLOB_NAME;

/// Size of the placeholder payload written when provisioning a lease blob.
pub const DEFAULT_PLACEHOLDER_SIZE: usize = 1024;

/// Per-request HTTP timeout used by network backends.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable settings shared by the engine and its backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Bytes of random content written into a freshly provisioned blob.
    pub placeholder_size: usize,

    /// Blob name used when the caller does not choose one.
    pub default_blob_name: String,

    /// User agent sent by network backends.
    pub user_agent: String,

    /// Per-request timeout for network backends.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placeholder_size: DEFAULT_PLACEHOLDER_SIZE,
            default_blob_name: DEFAULT_BLOB_NAME.to_string(),
            user_agent: format!("azblobleaseclient/{}", crate::VERSION),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Overrides the placeholder size.
    #[must_use]
    pub fn with_placeholder_size(mut self, size: usize) -> Self {
        self.placeholder_size = size;
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tool_conventions() {
        let config = EngineConfig::default();
        assert_eq!(config.placeholder_size, 1024);
        assert_eq!(config.default_blob_name, "azblobleaseblob");
        assert!(config.user_agent.starts_with("azblobleaseclient/"));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = EngineConfig::default()
            .with_placeholder_size(16)
            .with_request_timeout(Duration::from_secs(5));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"requestTimeout\":5"));
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
