//! Blob lease backend over the Azure REST APIs.
//!
//! The blob endpoint of the storage account is looked up once through
//! Resource Manager and cached. Every data-plane call carries a bearer token
//! for the storage scope.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use azlease_core::backend::{BlobProperties, LeaseBackend, LeaseReceipt, LeaseStatus};
use azlease_core::error::{BackendError, BackendResult};
use azlease_core::params::LeaseDuration;
use azlease_core::target::{LeaseTarget, LeaseToken};
use azlease_core::EngineConfig;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::cloud::CloudDescriptor;
use crate::credential::TokenCredential;
use crate::error::{classify, error_detail};

/// Token scope for Blob Storage requests.
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";
/// Blob service REST version.
pub const STORAGE_API_VERSION: &str = "2021-08-06";
/// Microsoft.Storage Resource Manager API version.
pub const MANAGEMENT_API_VERSION: &str = "2023-01-01";

/// Builds the HTTP client shared by credentials and the backend.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client(config: &EngineConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
}

/// [`LeaseBackend`] backed by Resource Manager and the Blob service.
pub struct AzureBlobBackend {
    http: Client,
    credential: Arc<dyn TokenCredential>,
    resource_manager: String,
    management_scope: String,
    endpoints: RwLock<HashMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageAccount {
    properties: StorageAccountProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageAccountProperties {
    primary_endpoints: PrimaryEndpoints,
}

#[derive(Deserialize)]
struct PrimaryEndpoints {
    blob: Option<String>,
}

impl AzureBlobBackend {
    /// Creates a backend for one cloud.
    #[must_use]
    pub fn new(http: Client, credential: Arc<dyn TokenCredential>, cloud: &CloudDescriptor) -> Self {
        Self {
            http,
            credential,
            resource_manager: cloud.resource_manager.clone(),
            management_scope: cloud.management_scope(),
            endpoints: RwLock::new(HashMap::new()),
        }
    }

    fn account_url(&self, target: &LeaseTarget) -> String {
        let account = target.account();
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}?api-version={MANAGEMENT_API_VERSION}",
            self.resource_manager,
            account.subscription_id(),
            account.resource_group(),
            account.account_name(),
        )
    }

    async fn blob_endpoint(&self, target: &LeaseTarget) -> BackendResult<String> {
        let key = self.account_url(target);
        if let Some(endpoint) = self.endpoints.read().await.get(&key) {
            return Ok(endpoint.clone());
        }

        let token = self.credential.get_token(&self.management_scope).await?;
        let response = self
            .http
            .get(&key)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(transport)?;
        let response = check(response).await?;
        let account: StorageAccount = response
            .json()
            .await
            .map_err(|e| BackendError::other(format!("invalid storage account response: {e}")))?;
        let endpoint = account.properties.primary_endpoints.blob.ok_or_else(|| {
            BackendError::other(format!(
                "storage account {} has no blob endpoint",
                target.account().account_name()
            ))
        })?;

        tracing::debug!(%endpoint, "resolved blob endpoint");
        self.endpoints.write().await.insert(key, endpoint.clone());
        Ok(endpoint)
    }

    async fn container_url(&self, target: &LeaseTarget) -> BackendResult<Url> {
        let mut url = resource_url(&self.blob_endpoint(target).await?, &[target.container()])?;
        url.query_pairs_mut().append_pair("restype", "container");
        Ok(url)
    }

    async fn blob_url(&self, target: &LeaseTarget) -> BackendResult<Url> {
        resource_url(
            &self.blob_endpoint(target).await?,
            &[target.container(), target.blob()],
        )
    }

    async fn lease_url(&self, target: &LeaseTarget) -> BackendResult<Url> {
        let mut url = self.blob_url(target).await?;
        url.query_pairs_mut().append_pair("comp", "lease");
        Ok(url)
    }

    async fn storage(&self, request: RequestBuilder) -> BackendResult<Response> {
        let token = self.credential.get_token(STORAGE_SCOPE).await?;
        let response = request
            .bearer_auth(&token.token)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("x-ms-date", http_date())
            .send()
            .await
            .map_err(transport)?;
        check(response).await
    }
}

#[async_trait]
impl LeaseBackend for AzureBlobBackend {
    async fn probe(&self, target: &LeaseTarget) -> BackendResult<String> {
        self.blob_endpoint(target).await
    }

    async fn container_properties(&self, target: &LeaseTarget) -> BackendResult<()> {
        let url = self.container_url(target).await?;
        self.storage(self.http.head(url)).await?;
        Ok(())
    }

    async fn create_container(&self, target: &LeaseTarget) -> BackendResult<()> {
        let url = self.container_url(target).await?;
        self.storage(self.http.put(url).header("Content-Length", "0"))
            .await?;
        Ok(())
    }

    async fn blob_properties(&self, target: &LeaseTarget) -> BackendResult<BlobProperties> {
        let url = self.blob_url(target).await?;
        let response = self.storage(self.http.head(url)).await?;
        let headers = response.headers();
        Ok(BlobProperties {
            size: header(headers, "content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            etag: header(headers, "etag"),
            lease_status: parse_lease_status(
                header(headers, "x-ms-lease-status").as_deref(),
                header(headers, "x-ms-lease-state").as_deref(),
            ),
        })
    }

    async fn upload_blob(&self, target: &LeaseTarget, data: Bytes) -> BackendResult<()> {
        let url = self.blob_url(target).await?;
        self.storage(
            self.http
                .put(url)
                .header("x-ms-blob-type", "BlockBlob")
                .header("Content-Type", "application/octet-stream")
                .body(data),
        )
        .await?;
        Ok(())
    }

    async fn acquire_lease(
        &self,
        target: &LeaseTarget,
        proposed: &LeaseToken,
        duration: LeaseDuration,
    ) -> BackendResult<LeaseReceipt> {
        let url = self.lease_url(target).await?;
        let response = self
            .storage(
                self.http
                    .put(url)
                    .header("Content-Length", "0")
                    .header("x-ms-lease-action", "acquire")
                    .header("x-ms-lease-duration", duration.as_secs().to_string())
                    .header("x-ms-proposed-lease-id", proposed.as_str()),
            )
            .await?;
        Ok(receipt(response.headers(), proposed))
    }

    async fn renew_lease(
        &self,
        target: &LeaseTarget,
        token: &LeaseToken,
    ) -> BackendResult<LeaseReceipt> {
        let url = self.lease_url(target).await?;
        let response = self
            .storage(
                self.http
                    .put(url)
                    .header("Content-Length", "0")
                    .header("x-ms-lease-action", "renew")
                    .header("x-ms-lease-id", token.as_str()),
            )
            .await?;
        Ok(receipt(response.headers(), token))
    }
}

fn resource_url(endpoint: &str, segments: &[&str]) -> BackendResult<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| BackendError::other(format!("invalid blob endpoint {endpoint}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| BackendError::other(format!("invalid blob endpoint {endpoint}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn receipt(headers: &HeaderMap, fallback: &LeaseToken) -> LeaseReceipt {
    LeaseReceipt {
        lease_id: header(headers, "x-ms-lease-id")
            .and_then(|id| id.parse().ok())
            .unwrap_or_else(|| fallback.clone()),
        request_id: header(headers, "x-ms-request-id").unwrap_or_default(),
    }
}

fn parse_lease_status(status: Option<&str>, state: Option<&str>) -> LeaseStatus {
    match (status, state) {
        (Some("locked"), _) => LeaseStatus::Leased,
        (_, Some("expired")) => LeaseStatus::Expired,
        _ => LeaseStatus::Available,
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::other(format!("request failed: {e}"))
}

async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = header(response.headers(), "x-ms-error-code");
    let body = response.text().await.unwrap_or_default();
    let detail = error_detail(&body);
    let code = code.or_else(|| arm_error_code(&body));
    Err(classify(status, code.as_deref(), &detail))
}

fn arm_error_code(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Envelope {
        error: Code,
    }

    #[derive(Deserialize)]
    struct Code {
        code: String,
    }

    serde_json::from_str::<Envelope>(body)
        .ok()
        .map(|e| e.error.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use azlease_core::BackendErrorKind;
    use reqwest::header::HeaderValue;

    #[test]
    fn builds_resource_urls() {
        let container = resource_url("https://acct.blob.core.windows.net/", &["leases"]).unwrap();
        assert_eq!(container.as_str(), "https://acct.blob.core.windows.net/leases");

        let blob = resource_url("https://acct.blob.core.windows.net", &["leases", "my blob"]).unwrap();
        assert_eq!(
            blob.as_str(),
            "https://acct.blob.core.windows.net/leases/my%20blob"
        );
    }

    #[test]
    fn rejects_bad_endpoint() {
        let err = resource_url("not a url", &["leases"]).unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Other);
    }

    #[test]
    fn receipt_prefers_service_lease_id() {
        let proposed = LeaseToken::generate();
        let granted = LeaseToken::generate();
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-lease-id", HeaderValue::from_str(granted.as_str()).unwrap());
        headers.insert("x-ms-request-id", HeaderValue::from_static("req-1"));

        let confirmed = receipt(&headers, &proposed);
        assert_eq!(confirmed.lease_id, granted);
        assert_eq!(confirmed.request_id, "req-1");

        let fallback = receipt(&HeaderMap::new(), &proposed);
        assert_eq!(fallback.lease_id, proposed);
    }

    #[test]
    fn lease_status_from_headers() {
        assert_eq!(parse_lease_status(Some("locked"), Some("leased")), LeaseStatus::Leased);
        assert_eq!(parse_lease_status(Some("unlocked"), Some("expired")), LeaseStatus::Expired);
        assert_eq!(parse_lease_status(None, None), LeaseStatus::Available);
    }

    #[test]
    fn arm_code_from_body() {
        let body = r#"{"error":{"code":"ResourceGroupNotFound","message":"missing"}}"#;
        assert_eq!(arm_error_code(body).as_deref(), Some("ResourceGroupNotFound"));
        assert_eq!(arm_error_code("<Error/>"), None);
    }

    #[test]
    fn http_date_is_rfc1123() {
        let date = http_date();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.len(), 29);
    }
}
