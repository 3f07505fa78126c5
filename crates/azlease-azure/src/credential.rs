//! Token credentials.
//!
//! A [`CredentialSelection`] is resolved once into a [`TokenCredential`]:
//!
//! - `Default`: environment client secret, then Azure CLI, then managed identity
//! - `SystemManagedIdentity`: instance metadata service, system-assigned identity
//! - `UserManagedIdentity`: instance metadata service, user-assigned identity
//!
//! Every resolved credential caches tokens per scope until shortly before
//! they expire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::cloud::CloudDescriptor;
use crate::error::CredentialError;

const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const IMDS_TIMEOUT: Duration = Duration::from_secs(5);
const REFRESH_MARGIN_SECS: i64 = 300;

/// Bearer token with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Raw token.
    pub token: String,
    /// Expiry instant.
    pub expires_on: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - chrono::Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// Source of bearer tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns a token for `scope` (e.g. `https://storage.azure.com/.default`).
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError>;
}

/// User-assigned managed identity reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedIdentityId {
    /// Application (client) id.
    ClientId(String),
    /// Full ARM resource id.
    ResourceId(String),
}

impl ManagedIdentityId {
    /// Ids containing `/` are resource ids, anything else a client id.
    #[must_use]
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        if id.contains('/') {
            Self::ResourceId(id.to_string())
        } else {
            Self::ClientId(id.to_string())
        }
    }

    fn query(&self) -> (&'static str, &str) {
        match self {
            Self::ClientId(id) => ("client_id", id),
            Self::ResourceId(id) => ("mi_res_id", id),
        }
    }
}

/// Which credential to use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CredentialSelection {
    /// Environment, then Azure CLI, then managed identity.
    #[default]
    Default,
    /// System-assigned managed identity.
    SystemManagedIdentity,
    /// User-assigned managed identity.
    UserManagedIdentity(ManagedIdentityId),
}

impl CredentialSelection {
    /// Derives the selection from command-line flags.
    ///
    /// The system identity flag wins over a user identity id.
    #[must_use]
    pub fn from_flags(managed_identity_id: Option<&str>, use_system_identity: bool) -> Self {
        match managed_identity_id.map(str::trim).filter(|id| !id.is_empty()) {
            _ if use_system_identity => Self::SystemManagedIdentity,
            Some(id) => Self::UserManagedIdentity(ManagedIdentityId::parse(id)),
            None => Self::Default,
        }
    }
}

/// Resolves a selection into a caching credential.
#[must_use]
pub fn resolve_credential(
    selection: &CredentialSelection,
    cloud: &CloudDescriptor,
    http: &reqwest::Client,
) -> Arc<dyn TokenCredential> {
    let inner: Box<dyn TokenCredential> = match selection {
        CredentialSelection::Default => {
            tracing::debug!("using default credential chain");
            let mut sources: Vec<Box<dyn TokenCredential>> = Vec::new();
            if let Some(env) = ClientSecretCredential::from_env(&cloud.authority_host, http) {
                sources.push(Box::new(env));
            }
            sources.push(Box::new(AzureCliCredential));
            sources.push(Box::new(ManagedIdentityCredential::new(None, http)));
            Box::new(ChainedCredential { sources })
        }
        CredentialSelection::SystemManagedIdentity => {
            tracing::debug!("using system-assigned managed identity");
            Box::new(ManagedIdentityCredential::new(None, http))
        }
        CredentialSelection::UserManagedIdentity(id) => {
            tracing::debug!(?id, "using user-assigned managed identity");
            Box::new(ManagedIdentityCredential::new(Some(id.clone()), http))
        }
    };
    Arc::new(CachedCredential::new(inner))
}

/// Caches tokens per scope.
pub struct CachedCredential {
    inner: Box<dyn TokenCredential>,
    tokens: Mutex<HashMap<String, AccessToken>>,
}

impl CachedCredential {
    /// Wraps a credential.
    #[must_use]
    pub fn new(inner: Box<dyn TokenCredential>) -> Self {
        Self {
            inner,
            tokens: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TokenCredential for CachedCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = tokens.get(scope).filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.clone());
        }
        let token = self.inner.get_token(scope).await?;
        tokens.insert(scope.to_string(), token.clone());
        Ok(token)
    }
}

struct ChainedCredential {
    sources: Vec<Box<dyn TokenCredential>>,
}

#[async_trait]
impl TokenCredential for ChainedCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let mut failures = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    tracing::debug!(error = %e, "credential source failed");
                    failures.push(e.to_string());
                }
            }
        }
        Err(CredentialError::Exhausted(failures))
    }
}

/// Service principal credential from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`
/// and `AZURE_CLIENT_SECRET`.
struct ClientSecretCredential {
    http: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    const NAME: &'static str = "EnvironmentCredential";

    fn from_env(authority_host: &str, http: &reqwest::Client) -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            http: http.clone(),
            authority_host: authority_host.to_string(),
            tenant_id: var("AZURE_TENANT_ID")?,
            client_id: var("AZURE_CLIENT_ID")?,
            client_secret: var("AZURE_CLIENT_SECRET")?,
        })
    }
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        );
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| unavailable(Self::NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected {
                source_name: Self::NAME,
                status,
                body,
            });
        }
        let parsed: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| invalid(Self::NAME, e))?;
        Ok(AccessToken {
            token: parsed.access_token,
            expires_on: Utc::now() + chrono::Duration::seconds(parsed.expires_in),
        })
    }
}

/// Token from the signed-in Azure CLI.
struct AzureCliCredential;

impl AzureCliCredential {
    const NAME: &'static str = "AzureCliCredential";
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: Option<String>,
    #[serde(default, rename = "expires_on")]
    expires_on_epoch: Option<i64>,
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let output = tokio::process::Command::new("az")
            .args(["account", "get-access-token", "--output", "json", "--scope", scope])
            .output()
            .await
            .map_err(|e| unavailable(Self::NAME, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(unavailable(Self::NAME, stderr.trim()));
        }
        parse_cli_token(&output.stdout)
    }
}

fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken, CredentialError> {
    let parsed: CliTokenResponse = serde_json::from_slice(stdout)
        .map_err(|e| invalid(AzureCliCredential::NAME, e))?;

    let expires_on = match (parsed.expires_on_epoch, parsed.expires_on.as_deref()) {
        (Some(epoch), _) => DateTime::from_timestamp(epoch, 0),
        (None, Some(local)) => NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
            .map(|t| t.with_timezone(&Utc)),
        (None, None) => None,
    }
    .ok_or_else(|| invalid(AzureCliCredential::NAME, "missing or unparseable expiry"))?;

    Ok(AccessToken {
        token: parsed.access_token,
        expires_on,
    })
}

/// Token from the instance metadata service.
struct ManagedIdentityCredential {
    http: reqwest::Client,
    identity: Option<ManagedIdentityId>,
}

impl ManagedIdentityCredential {
    const NAME: &'static str = "ManagedIdentityCredential";

    fn new(identity: Option<ManagedIdentityId>, http: &reqwest::Client) -> Self {
        Self {
            http: http.clone(),
            identity,
        }
    }
}

#[derive(Deserialize)]
struct ImdsTokenResponse {
    access_token: String,
    expires_on: String,
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let resource = scope.trim_end_matches("/.default");
        let mut request = self
            .http
            .get(IMDS_TOKEN_URL)
            .header("Metadata", "true")
            .timeout(IMDS_TIMEOUT)
            .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)]);
        if let Some(identity) = &self.identity {
            request = request.query(&[identity.query()]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| unavailable(Self::NAME, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected {
                source_name: Self::NAME,
                status,
                body,
            });
        }

        let parsed: ImdsTokenResponse = response
            .json()
            .await
            .map_err(|e| invalid(Self::NAME, e))?;
        let expires_on = parsed
            .expires_on
            .parse::<i64>()
            .ok()
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
            .ok_or_else(|| invalid(Self::NAME, "unparseable expires_on"))?;
        Ok(AccessToken {
            token: parsed.access_token,
            expires_on,
        })
    }
}

fn unavailable(source_name: &'static str, e: impl std::fmt::Display) -> CredentialError {
    CredentialError::Unavailable {
        source_name,
        message: e.to_string(),
    }
}

fn invalid(source_name: &'static str, e: impl std::fmt::Display) -> CredentialError {
    CredentialError::InvalidResponse {
        source_name,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCredential {
        calls: Arc<AtomicUsize>,
        lifetime: chrono::Duration,
    }

    #[async_trait]
    impl TokenCredential for CountingCredential {
        async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken {
                token: format!("{scope}#{n}"),
                expires_on: Utc::now() + self.lifetime,
            })
        }
    }

    struct FailingCredential(&'static str);

    #[async_trait]
    impl TokenCredential for FailingCredential {
        async fn get_token(&self, _scope: &str) -> Result<AccessToken, CredentialError> {
            Err(unavailable(self.0, "not configured"))
        }
    }

    #[test]
    fn identity_id_kind() {
        assert_eq!(
            ManagedIdentityId::parse("/subscriptions/s/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id"),
            ManagedIdentityId::ResourceId("/subscriptions/s/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id".into())
        );
        assert_eq!(
            ManagedIdentityId::parse("11111111-2222-3333-4444-555555555555"),
            ManagedIdentityId::ClientId("11111111-2222-3333-4444-555555555555".into())
        );
    }

    #[test]
    fn selection_from_flags() {
        assert_eq!(CredentialSelection::from_flags(None, false), CredentialSelection::Default);
        assert_eq!(CredentialSelection::from_flags(Some(""), false), CredentialSelection::Default);
        assert_eq!(
            CredentialSelection::from_flags(Some("abc"), true),
            CredentialSelection::SystemManagedIdentity
        );
        assert_eq!(
            CredentialSelection::from_flags(Some("abc"), false),
            CredentialSelection::UserManagedIdentity(ManagedIdentityId::ClientId("abc".into()))
        );
    }

    #[tokio::test]
    async fn cache_reuses_fresh_tokens_per_scope() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedCredential::new(Box::new(CountingCredential {
            calls: calls.clone(),
            lifetime: chrono::Duration::hours(1),
        }));

        let a = cached.get_token("storage").await.unwrap();
        let b = cached.get_token("storage").await.unwrap();
        let c = cached.get_token("management").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a.token, c.token);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_refreshes_tokens_near_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedCredential::new(Box::new(CountingCredential {
            calls: calls.clone(),
            lifetime: chrono::Duration::seconds(60),
        }));

        cached.get_token("storage").await.unwrap();
        cached.get_token("storage").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn chain_falls_through_to_working_source() {
        let chain = ChainedCredential {
            sources: vec![
                Box::new(FailingCredential("first")),
                Box::new(CountingCredential {
                    calls: Arc::new(AtomicUsize::new(0)),
                    lifetime: chrono::Duration::hours(1),
                }),
            ],
        };
        assert_eq!(chain.get_token("scope").await.unwrap().token, "scope#0");
    }

    #[tokio::test]
    async fn exhausted_chain_reports_all_sources() {
        let chain = ChainedCredential {
            sources: vec![
                Box::new(FailingCredential("first")),
                Box::new(FailingCredential("second")),
            ],
        };
        let err = chain.get_token("scope").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("first unavailable"));
        assert!(message.contains("second unavailable"));
    }

    #[test]
    fn cli_token_with_epoch_expiry() {
        let json = br#"{"accessToken":"tok","expiresOn":"2030-01-01 00:00:00.000000","expires_on":1893456000,"tokenType":"Bearer"}"#;
        let token = parse_cli_token(json).unwrap();
        assert_eq!(token.token, "tok");
        assert_eq!(token.expires_on.timestamp(), 1_893_456_000);
    }

    #[test]
    fn cli_token_with_local_expiry() {
        let json = br#"{"accessToken":"tok","expiresOn":"2030-01-01 00:00:00.000000"}"#;
        let token = parse_cli_token(json).unwrap();
        assert!(token.expires_on > Utc::now());
    }

    #[test]
    fn debug_redacts_token() {
        let token = AccessToken {
            token: "secret".into(),
            expires_on: Utc::now(),
        };
        assert!(!format!("{token:?}").contains("secret"));
    }
}
