//! Flags and setup shared by every lease subcommand.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use azlease_azure::{
    AzureBlobBackend, CloudDescriptor, CloudEnvironment, CredentialSelection, http_client,
    resolve_credential,
};
use azlease_core::target::{AccountCoordinates, LeaseTarget};
use clap::Args;

use crate::Config;
use crate::exit::{ArgumentError, CliError, ExitCode};

/// Storage account, blob and identity selection.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Subscription id.
    #[arg(long = "subscriptionid")]
    pub subscription_id: Option<String>,

    /// Resource group name of the storage account.
    #[arg(long = "resourcegroupname")]
    pub resource_group_name: Option<String>,

    /// Storage account name.
    #[arg(long = "accountname")]
    pub account_name: Option<String>,

    /// Blob container name.
    #[arg(long = "container")]
    pub container: Option<String>,

    /// Blob name [default: azblobleaseblob].
    #[arg(long = "blobname")]
    pub blob_name: Option<String>,

    /// Azure cloud environment.
    #[arg(long = "environment", default_value = "AZUREPUBLICCLOUD")]
    pub environment: String,

    /// User-assigned managed identity (resource id or client id).
    #[arg(long = "managed-identity-id")]
    pub managed_identity_id: Option<String>,

    /// Use the system-assigned managed identity.
    #[arg(long = "use-system-managed-identity")]
    pub use_system_managed_identity: bool,

    /// Cloud configuration file, only used with environment CUSTOMCLOUD.
    #[arg(long = "custom-cloudconfig-file")]
    pub custom_cloud_config_file: Option<PathBuf>,
}

impl TargetArgs {
    /// Validates the account and blob coordinates.
    ///
    /// Checked in order: subscription, resource group, account, container.
    ///
    /// # Errors
    ///
    /// Returns the first missing argument.
    pub fn target(&self, config: &Config) -> Result<LeaseTarget, ArgumentError> {
        let subscription = required(
            self.subscription_id.as_deref(),
            "subscriptionid",
            ExitCode::MissingSubscription,
        )?;
        let resource_group = required(
            self.resource_group_name.as_deref(),
            "resourcegroupname",
            ExitCode::MissingResourceGroup,
        )?;
        let account = required(
            self.account_name.as_deref(),
            "accountname",
            ExitCode::MissingAccountName,
        )?;
        let container = required(
            self.container.as_deref(),
            "container",
            ExitCode::MissingContainer,
        )?;
        let blob = self
            .blob_name
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(config.engine.default_blob_name.as_str());

        let account = AccountCoordinates::new(subscription, resource_group, account)?;
        Ok(LeaseTarget::new(account, container, blob)?)
    }

    /// Validates the cloud environment and optional cloud file.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown environment or an unusable cloud file.
    pub fn cloud(&self) -> Result<CloudDescriptor, ArgumentError> {
        let environment: CloudEnvironment = self.environment.parse()?;
        let file = self
            .custom_cloud_config_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty());
        Ok(CloudDescriptor::resolve(environment, file)?)
    }

    /// Credential chosen by the identity flags.
    #[must_use]
    pub fn credential_selection(&self) -> CredentialSelection {
        CredentialSelection::from_flags(
            self.managed_identity_id.as_deref(),
            self.use_system_managed_identity,
        )
    }
}

fn required<'a>(
    value: Option<&'a str>,
    flag: &'static str,
    code: ExitCode,
) -> Result<&'a str, ArgumentError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ArgumentError::Missing { flag, code })
}

/// Wraps argument errors of `command` so its help is printed.
pub fn invalid(command: &'static str) -> impl Fn(ArgumentError) -> CliError {
    move |source| CliError::Argument { command, source }
}

/// Builds the Azure backend after checking that a token can be obtained.
///
/// # Errors
///
/// Returns [`CliError::Authentication`] if no management token is available.
pub async fn connect(
    args: &TargetArgs,
    cloud: &CloudDescriptor,
    config: &Config,
) -> Result<Arc<AzureBlobBackend>> {
    let http = http_client(&config.engine).context("Failed to create HTTP client")?;
    let credential = resolve_credential(&args.credential_selection(), cloud, &http);

    credential
        .get_token(&cloud.management_scope())
        .await
        .map_err(CliError::Authentication)?;
    tracing::debug!(environment = %cloud.environment, "credential ready");

    Ok(Arc::new(AzureBlobBackend::new(http, credential, cloud)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> TargetArgs {
        TargetArgs {
            subscription_id: Some("sub".into()),
            resource_group_name: Some("rg".into()),
            account_name: Some("acct".into()),
            container: Some("Leases".into()),
            blob_name: None,
            environment: "azurepubliccloud".into(),
            managed_identity_id: None,
            use_system_managed_identity: false,
            custom_cloud_config_file: None,
        }
    }

    #[test]
    fn target_lowercases_container_and_defaults_blob() {
        let target = args().target(&Config::default()).unwrap();
        assert_eq!(target.container(), "leases");
        assert_eq!(target.blob(), "azblobleaseblob");
    }

    #[test]
    fn first_missing_argument_wins() {
        let mut missing = args();
        missing.subscription_id = None;
        missing.account_name = Some("  ".into());
        let err = missing.target(&Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::MissingSubscription);

        missing.subscription_id = Some("sub".into());
        let err = missing.target(&Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::MissingAccountName);
    }

    #[test]
    fn cloud_is_case_insensitive() {
        let cloud = args().cloud().unwrap();
        assert_eq!(cloud.environment, CloudEnvironment::Public);
    }

    #[test]
    fn unknown_cloud() {
        let mut bad = args();
        bad.environment = "AZUREGERMANCLOUD".into();
        assert_eq!(bad.cloud().unwrap_err().exit_code(), ExitCode::InvalidCloud);
    }
}
