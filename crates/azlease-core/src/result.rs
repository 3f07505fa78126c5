//! The single structured result every invocation ends with.
//!
//! Components return an [`Outcome`]; [`OperationResult::report`] turns it into
//! the wire record. Wire shape:
//!
//! ```json
//! {
//!   "operation": "acquire",
//!   "leaseId": "d3d63201-153b-453b-85ef-6c3bee3082f0",
//!   "status": "Success",
//!   "errorMessage": null,
//!   "subscriptionId": "...",
//!   "resourceGroupName": "...",
//!   "storageAccountName": "...",
//!   "containerName": "...",
//!   "blobName": "..."
//! }
//! ```
//!
//! `leaseId` and `errorMessage` are never both set. Empty strings are written
//! and read back as `null`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::target::{LeaseTarget, LeaseToken};

/// Which command produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Lease blob provisioning.
    CreateLeaseBlob,
    /// Lease acquisition.
    Acquire,
    /// Lease renewal.
    Renew,
}

impl Operation {
    /// Command name as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateLeaseBlob => "createleaseblob",
            Self::Acquire => "acquire",
            Self::Renew => "renew",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    /// Blob created, or lease acquired.
    Success,
    /// Blob already existed; nothing was written.
    SuccessAlreadyExists,
    /// Every renewal iteration succeeded.
    SuccessOnRenew,
    /// The operation failed.
    Fail,
}

impl OperationStatus {
    /// Returns whether this is one of the success codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Fail)
    }
}

/// What a component concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The lease blob was created.
    Provisioned,
    /// The lease blob already existed.
    AlreadyExists,
    /// The lease was acquired under this token.
    Acquired(LeaseToken),
    /// All renewal iterations succeeded; last token confirmed by the backend.
    Renewed(LeaseToken),
    /// The operation failed with this message.
    Failed(String),
}

impl Outcome {
    /// Status code for this outcome.
    #[must_use]
    pub const fn status(&self) -> OperationStatus {
        match self {
            Self::Provisioned | Self::Acquired(_) => OperationStatus::Success,
            Self::AlreadyExists => OperationStatus::SuccessAlreadyExists,
            Self::Renewed(_) => OperationStatus::SuccessOnRenew,
            Self::Failed(_) => OperationStatus::Fail,
        }
    }
}

/// Wire record for the result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    /// Command name.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub operation: Option<String>,
    /// Lease id, set only on acquisition or renewal success.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub lease_id: Option<String>,
    /// Final status.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub status: Option<OperationStatus>,
    /// Error text, set only on failure.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub error_message: Option<String>,
    /// Echo of the subscription id.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub subscription_id: Option<String>,
    /// Echo of the resource group.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub resource_group_name: Option<String>,
    /// Echo of the storage account.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub storage_account_name: Option<String>,
    /// Echo of the container.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub container_name: Option<String>,
    /// Echo of the blob name.
    #[serde(default, deserialize_with = "empty_as_none::deserialize")]
    pub blob_name: Option<String>,
}

impl OperationResult {
    /// Renders an outcome into a wire record.
    ///
    /// Pure; the token/error exclusivity and the empty-string normalisation
    /// are applied here and nowhere else.
    #[must_use]
    pub fn report(operation: Operation, target: &LeaseTarget, outcome: Outcome) -> Self {
        let status = outcome.status();
        let (lease_id, error_message) = match outcome {
            Outcome::Acquired(token) | Outcome::Renewed(token) => {
                (non_empty(token.into_string()), None)
            }
            Outcome::Failed(message) => (None, non_empty(strip_quotes(&message))),
            Outcome::Provisioned | Outcome::AlreadyExists => (None, None),
        };

        let account = target.account();
        Self {
            operation: Some(operation.as_str().to_string()),
            lease_id,
            status: Some(status),
            error_message,
            subscription_id: non_empty(account.subscription_id().to_string()),
            resource_group_name: non_empty(account.resource_group().to_string()),
            storage_account_name: non_empty(account.account_name().to_string()),
            container_name: non_empty(target.container().to_string()),
            blob_name: non_empty(target.blob().to_string()),
        }
    }

    /// Returns whether the status is one of the success codes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(OperationStatus::is_success)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Removes double quotes from backend error text so it embeds cleanly.
#[must_use]
pub fn strip_quotes(message: &str) -> String {
    message.replace('"', "")
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

mod empty_as_none {
    use serde::de::IntoDeserializer;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(value) if !value.is_empty() => {
                T::deserialize(value.into_deserializer()).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::AccountCoordinates;

    fn target() -> LeaseTarget {
        let account = AccountCoordinates::new("sub-1", "rg-1", "acct").unwrap();
        LeaseTarget::new(account, "leases", "azblobleaseblob").unwrap()
    }

    #[test]
    fn acquired_sets_token_only() {
        let token = LeaseToken::generate();
        let result =
            OperationResult::report(Operation::Acquire, &target(), Outcome::Acquired(token.clone()));
        assert_eq!(result.lease_id.as_deref(), Some(token.as_str()));
        assert!(result.error_message.is_none());
        assert_eq!(result.status, Some(OperationStatus::Success));
        assert_eq!(result.operation.as_deref(), Some("acquire"));
    }

    #[test]
    fn failure_sets_error_only_and_strips_quotes() {
        let result = OperationResult::report(
            Operation::Acquire,
            &target(),
            Outcome::Failed("lease \"already\" present".into()),
        );
        assert!(result.lease_id.is_none());
        assert_eq!(result.error_message.as_deref(), Some("lease already present"));
        assert_eq!(result.status, Some(OperationStatus::Fail));
        assert!(!result.is_success());
    }

    #[test]
    fn provisioning_reports_neither_token_nor_error() {
        let created =
            OperationResult::report(Operation::CreateLeaseBlob, &target(), Outcome::Provisioned);
        assert!(created.lease_id.is_none() && created.error_message.is_none());
        assert_eq!(created.status, Some(OperationStatus::Success));

        let existing =
            OperationResult::report(Operation::CreateLeaseBlob, &target(), Outcome::AlreadyExists);
        assert_eq!(existing.status, Some(OperationStatus::SuccessAlreadyExists));
    }

    #[test]
    fn renewed_uses_renew_specific_status() {
        let token = LeaseToken::generate();
        let result = OperationResult::report(Operation::Renew, &target(), Outcome::Renewed(token));
        assert_eq!(result.status, Some(OperationStatus::SuccessOnRenew));
        assert!(result.is_success());
    }

    #[test]
    fn empty_error_becomes_null() {
        let result = OperationResult::report(Operation::Renew, &target(), Outcome::Failed(String::new()));
        assert!(result.error_message.is_none());
        let json = result.to_json().unwrap();
        assert!(json.contains("\"errorMessage\": null"));
    }

    #[test]
    fn wire_field_names_are_stable() {
        let result = OperationResult::report(Operation::Acquire, &target(), Outcome::Failed("x".into()));
        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        for field in [
            "operation",
            "leaseId",
            "status",
            "errorMessage",
            "subscriptionId",
            "resourceGroupName",
            "storageAccountName",
            "containerName",
            "blobName",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(value["leaseId"], serde_json::Value::Null);
        assert_eq!(value["status"], "Fail");
    }

    #[test]
    fn empty_strings_deserialize_to_null() {
        let json = r#"{
            "operation": "",
            "leaseId": "",
            "status": "",
            "errorMessage": "",
            "subscriptionId": "sub",
            "resourceGroupName": "",
            "storageAccountName": "",
            "containerName": "",
            "blobName": ""
        }"#;
        let result: OperationResult = serde_json::from_str(json).unwrap();
        assert!(result.operation.is_none());
        assert!(result.lease_id.is_none());
        assert!(result.status.is_none());
        assert!(result.error_message.is_none());
        assert_eq!(result.subscription_id.as_deref(), Some("sub"));

        let reserialized = serde_json::to_value(&result).unwrap();
        assert_eq!(reserialized["status"], serde_json::Value::Null);
        assert_eq!(reserialized["leaseId"], serde_json::Value::Null);
    }

    #[test]
    fn status_parses_from_wire_names() {
        let result: OperationResult =
            serde_json::from_str(r#"{"status": "SuccessOnRenew"}"#).unwrap();
        assert_eq!(result.status, Some(OperationStatus::SuccessOnRenew));
    }
}
