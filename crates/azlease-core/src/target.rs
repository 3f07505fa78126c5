//! Lease targets and lease tokens.
//!
//! A [`LeaseTarget`] names the blob used purely as the substrate for a lease.
//! A [`LeaseToken`] is the client-chosen identifier proposed on acquisition and
//! handed back on every renewal.
//!
//! # Example
//!
//! ```rust
//! use azlease_core::target::{AccountCoordinates, LeaseTarget, LeaseToken};
//!
//! let account = AccountCoordinates::new("sub-1", "rg-1", "mystorage").unwrap();
//! let target = LeaseTarget::new(account, "Leases", "azblobleaseblob").unwrap();
//! assert_eq!(target.container(), "leases");
//!
//! let token = LeaseToken::generate();
//! assert_eq!(token.as_str().len(), 36);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Default blob name used when none is given.
pub const DEFAULT_BLOB_NAME: &str = "azblobleaseblob";

/// Management-plane coordinates of a storage account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCoordinates {
    subscription_id: String,
    resource_group: String,
    account_name: String,
}

impl AccountCoordinates {
    /// Creates account coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] if any part is empty.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let subscription_id = non_empty(subscription_id.into(), "subscription id")?;
        let resource_group = non_empty(resource_group.into(), "resource group name")?;
        let account_name = non_empty(account_name.into(), "storage account name")?;
        Ok(Self {
            subscription_id,
            resource_group,
            account_name,
        })
    }

    /// Subscription holding the storage account.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Resource group holding the storage account.
    #[must_use]
    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    /// Storage account name.
    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account_name
    }
}

/// The blob used as the lease object.
///
/// Immutable once built. Container names are lower-cased on construction
/// because the blob service only accepts lower-case container names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTarget {
    account: AccountCoordinates,
    container: String,
    blob: String,
}

impl LeaseTarget {
    /// Creates a lease target.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] if the container or blob name is empty.
    pub fn new(
        account: AccountCoordinates,
        container: impl AsRef<str>,
        blob: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let container = non_empty(container.as_ref().to_lowercase(), "container")?;
        let blob = non_empty(blob.into(), "blob name")?;
        Ok(Self {
            account,
            container,
            blob,
        })
    }

    /// Account coordinates.
    #[must_use]
    pub fn account(&self) -> &AccountCoordinates {
        &self.account
    }

    /// Container name (lower-case).
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Blob name.
    #[must_use]
    pub fn blob(&self) -> &str {
        &self.blob
    }

    /// `container/blob`, used in logs and as the in-memory key.
    #[must_use]
    pub fn blob_path(&self) -> String {
        format!("{}/{}", self.container, self.blob)
    }
}

impl fmt::Display for LeaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.account.account_name, self.container, self.blob
        )
    }
}

/// A lease identifier proposed by the client.
///
/// Generated tokens are random UUIDs in canonical hyphenated form. Tokens
/// coming back from callers (for renewal) are treated as opaque strings since
/// the backend, not this client, decides whether they are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaseToken(String);

impl LeaseToken {
    /// Generates a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LeaseToken {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "lease id" });
        }
        Ok(Self(trimmed.to_string()))
    }
}

fn non_empty(value: String, field: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(value)
    }
}
