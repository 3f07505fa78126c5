//! Storage backend contract for blob leases.
//!
//! The engine talks to object storage only through [`LeaseBackend`]. The
//! backend is the sole arbiter of mutual exclusion: it grants a lease to one
//! proposed id at a time and rejects everybody else until the lease expires.
//!
//! Implementations:
//! - `azlease_azure::AzureBlobBackend`: Resource Manager + Blob REST API
//! - [`MemoryLeaseBackend`](crate::memory::MemoryLeaseBackend): in-process, for tests
//!
//! There is no release primitive. Leases end by expiry only; a release call
//! would be a new method on this trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendResult;
use crate::params::LeaseDuration;
use crate::target::{LeaseTarget, LeaseToken};

/// Lease status of a blob as reported by its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaseStatus {
    /// No active lease.
    #[default]
    Available,
    /// A lease is held by someone.
    Leased,
    /// The last lease ran out without renewal.
    Expired,
}

/// Properties of the lease blob.
///
/// Only logged by provisioning. Lease decisions are made by the backend's
/// conditional lease calls, never from these fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobProperties {
    /// Content length in bytes.
    pub size: u64,
    /// Entity tag, if the backend reports one.
    pub etag: Option<String>,
    /// Current lease status.
    pub lease_status: LeaseStatus,
}

/// Successful response of an acquire or renew call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseReceipt {
    /// Lease id confirmed by the backend.
    pub lease_id: LeaseToken,
    /// Backend-assigned request identifier, for operator diagnostics.
    pub request_id: String,
}

/// Object storage operations needed by the lease engine.
#[async_trait]
pub trait LeaseBackend: Send + Sync {
    /// Looks up the account properties and returns its blob endpoint.
    ///
    /// Acquisition and renewal use this as the reachability check before the
    /// first lease call.
    async fn probe(&self, target: &LeaseTarget) -> BackendResult<String>;

    /// Reads container properties.
    ///
    /// Returns a `NotFound` error if the container does not exist.
    async fn container_properties(&self, target: &LeaseTarget) -> BackendResult<()>;

    /// Creates the container.
    async fn create_container(&self, target: &LeaseTarget) -> BackendResult<()>;

    /// Reads blob properties.
    ///
    /// Returns a `NotFound` error if the blob does not exist.
    async fn blob_properties(&self, target: &LeaseTarget) -> BackendResult<BlobProperties>;

    /// Uploads the blob as a block blob.
    async fn upload_blob(&self, target: &LeaseTarget, data: Bytes) -> BackendResult<()>;

    /// Conditionally acquires a lease on the blob with a client-proposed id.
    ///
    /// Fails if another id holds an unexpired lease.
    async fn acquire_lease(
        &self,
        target: &LeaseTarget,
        proposed: &LeaseToken,
        duration: LeaseDuration,
    ) -> BackendResult<LeaseReceipt>;

    /// Renews the lease held under `token`, restarting its duration.
    ///
    /// Fails if the token does not match the current lease.
    async fn renew_lease(
        &self,
        target: &LeaseTarget,
        token: &LeaseToken,
    ) -> BackendResult<LeaseReceipt>;
}
