//! Cloud environments.
//!
//! Three sovereign clouds are built in. Anything else is described by a JSON
//! file in the shape printed by `az cloud show`:
//!
//! ```json
//! {
//!   "name": "MyCloud",
//!   "endpoints": {
//!     "activeDirectory": "https://login.mycloud.example",
//!     "resourceManager": "https://management.mycloud.example/",
//!     "activeDirectoryResourceId": "https://management.core.mycloud.example/"
//!   }
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CloudConfigError;

/// Cloud environment selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudEnvironment {
    /// Azure public cloud.
    Public,
    /// Azure US Government.
    UsGovernment,
    /// Azure China.
    China,
    /// Endpoints loaded from a cloud file.
    Custom,
}

impl CloudEnvironment {
    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "AZUREPUBLICCLOUD",
            Self::UsGovernment => "AZUREUSGOVERNMENTCLOUD",
            Self::China => "AZURECHINACLOUD",
            Self::Custom => "CUSTOMCLOUD",
        }
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudEnvironment {
    type Err = CloudConfigError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AZUREPUBLICCLOUD" => Ok(Self::Public),
            "AZUREUSGOVERNMENTCLOUD" => Ok(Self::UsGovernment),
            "AZURECHINACLOUD" => Ok(Self::China),
            "CUSTOMCLOUD" => Ok(Self::Custom),
            other => Err(CloudConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Endpoints of one cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudDescriptor {
    /// Environment this descriptor was built for.
    pub environment: CloudEnvironment,
    /// Entra ID authority host, no trailing slash.
    pub authority_host: String,
    /// Resource Manager endpoint, no trailing slash.
    pub resource_manager: String,
    /// Audience for management-plane tokens, no trailing slash.
    pub management_audience: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudFile {
    endpoints: CloudFileEndpoints,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudFileEndpoints {
    active_directory: String,
    resource_manager: String,
    #[serde(default)]
    active_directory_resource_id: Option<String>,
}

impl CloudDescriptor {
    /// Resolves the environment and optional cloud file into endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is given for a built-in cloud, missing for
    /// `CUSTOMCLOUD`, or cannot be loaded.
    pub fn resolve(
        environment: CloudEnvironment,
        cloud_file: Option<&Path>,
    ) -> Result<Self, CloudConfigError> {
        match (environment, cloud_file) {
            (CloudEnvironment::Custom, Some(path)) => Self::load(path),
            (CloudEnvironment::Custom, None) => Err(CloudConfigError::FileRequired),
            (_, Some(_)) => Err(CloudConfigError::FileOnlyForCustom),
            (builtin, None) => Ok(Self::builtin(builtin)),
        }
    }

    fn builtin(environment: CloudEnvironment) -> Self {
        let (authority, manager) = match environment {
            CloudEnvironment::UsGovernment => (
                "https://login.microsoftonline.us",
                "https://management.usgovcloudapi.net",
            ),
            CloudEnvironment::China => (
                "https://login.chinacloudapi.cn",
                "https://management.chinacloudapi.cn",
            ),
            CloudEnvironment::Public | CloudEnvironment::Custom => (
                "https://login.microsoftonline.com",
                "https://management.azure.com",
            ),
        };
        Self {
            environment,
            authority_host: authority.to_string(),
            resource_manager: manager.to_string(),
            management_audience: manager.to_string(),
        }
    }

    /// Loads a custom cloud from an `az cloud show` style file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or malformed.
    pub fn load(path: &Path) -> Result<Self, CloudConfigError> {
        if !path.exists() {
            return Err(CloudConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| CloudConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CloudFile =
            serde_json::from_str(&raw).map_err(|e| CloudConfigError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let endpoints = file.endpoints;
        let resource_manager = trim_slash(&endpoints.resource_manager);
        if endpoints.active_directory.trim().is_empty() || resource_manager.is_empty() {
            return Err(CloudConfigError::Malformed {
                path: path.to_path_buf(),
                message: "activeDirectory and resourceManager endpoints are required".into(),
            });
        }
        let management_audience = endpoints
            .active_directory_resource_id
            .as_deref()
            .map(trim_slash)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| resource_manager.clone());

        Ok(Self {
            environment: CloudEnvironment::Custom,
            authority_host: trim_slash(&endpoints.active_directory),
            resource_manager,
            management_audience,
        })
    }

    /// Token scope for Resource Manager calls.
    #[must_use]
    pub fn management_scope(&self) -> String {
        format!("{}/.default", self.management_audience)
    }
}

fn trim_slash(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
