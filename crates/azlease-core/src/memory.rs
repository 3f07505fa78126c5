//! In-memory lease backend for testing.
//!
//! Thread-safe via `RwLock`. Not suitable for production. Lease rules follow
//! the blob service:
//! - acquiring with the id that already holds the lease succeeds and restarts it
//! - acquiring with another id fails while the lease is active
//! - renewing requires the current id; an expired lease may still be renewed by
//!   its last holder as long as nobody else took it in between

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::backend::{BlobProperties, LeaseBackend, LeaseReceipt, LeaseStatus};
use crate::error::{BackendError, BackendResult};
use crate::params::LeaseDuration;
use crate::target::{AccountCoordinates, LeaseTarget, LeaseToken};

/// In-memory object store with blob lease semantics.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseBackend {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    unreachable: bool,
    containers: HashSet<(AccountCoordinates, String)>,
    blobs: HashMap<LeaseTarget, StoredBlob>,
    uploads: u64,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    version: u64,
    lease: Option<LeaseRecord>,
}

#[derive(Debug, Clone)]
struct LeaseRecord {
    id: LeaseToken,
    period: Duration,
    expires_at: Instant,
}

impl LeaseRecord {
    fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl MemoryLeaseBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every probe fail, as if the account could not be resolved.
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut state) = self.state.write() {
            state.unreachable = unreachable;
        }
    }

    /// Returns the content of a blob, if present.
    #[must_use]
    pub fn blob_content(&self, target: &LeaseTarget) -> Option<Bytes> {
        self.state
            .read()
            .ok()?
            .blobs
            .get(target)
            .map(|blob| blob.data.clone())
    }

    /// Number of uploads performed so far.
    #[must_use]
    pub fn upload_count(&self) -> u64 {
        self.state.read().map(|state| state.uploads).unwrap_or(0)
    }

    /// Returns the id currently holding an active lease on the blob.
    #[must_use]
    pub fn active_holder(&self, target: &LeaseTarget) -> Option<LeaseToken> {
        let now = Instant::now();
        self.state
            .read()
            .ok()?
            .blobs
            .get(target)?
            .lease
            .as_ref()
            .filter(|lease| lease.is_active(now))
            .map(|lease| lease.id.clone())
    }

    /// Ends the current lease as if its duration had elapsed.
    ///
    /// The last holder keeps the right to renew until somebody else acquires.
    pub fn expire_lease(&self, target: &LeaseTarget) {
        if let Ok(mut state) = self.state.write() {
            if let Some(lease) = state
                .blobs
                .get_mut(target)
                .and_then(|blob| blob.lease.as_mut())
            {
                lease.expires_at = Instant::now()
                    .checked_sub(Duration::from_millis(1))
                    .unwrap_or_else(Instant::now);
            }
        }
    }

    fn read(&self) -> BackendResult<std::sync::RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| BackendError::other("lock poisoned"))
    }

    fn write(&self) -> BackendResult<std::sync::RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| BackendError::other("lock poisoned"))
    }
}

fn request_id() -> String {
    Uuid::new_v4().to_string()
}

fn container_key(target: &LeaseTarget) -> (AccountCoordinates, String) {
    (target.account().clone(), target.container().to_string())
}

fn blob_not_found(target: &LeaseTarget) -> BackendError {
    BackendError::not_found(format!(
        "BlobNotFound: The specified blob does not exist. ({})",
        target.blob_path()
    ))
}

#[async_trait]
impl LeaseBackend for MemoryLeaseBackend {
    async fn probe(&self, target: &LeaseTarget) -> BackendResult<String> {
        let state = self.read()?;
        if state.unreachable {
            return Err(BackendError::other(format!(
                "ResourceNotFound: storage account {} could not be resolved",
                target.account().account_name()
            )));
        }
        Ok(format!(
            "memory://{}.blob.local/",
            target.account().account_name()
        ))
    }

    async fn container_properties(&self, target: &LeaseTarget) -> BackendResult<()> {
        if self.read()?.containers.contains(&container_key(target)) {
            Ok(())
        } else {
            Err(BackendError::not_found(format!(
                "ContainerNotFound: The specified container does not exist. ({})",
                target.container()
            )))
        }
    }

    async fn create_container(&self, target: &LeaseTarget) -> BackendResult<()> {
        let mut state = self.write()?;
        if !state.containers.insert(container_key(target)) {
            return Err(BackendError::conflict(
                "ContainerAlreadyExists: The specified container already exists.",
            ));
        }
        Ok(())
    }

    async fn blob_properties(&self, target: &LeaseTarget) -> BackendResult<BlobProperties> {
        let now = Instant::now();
        let state = self.read()?;
        let blob = state
            .blobs
            .get(target)
            .ok_or_else(|| blob_not_found(target))?;
        let lease_status = match &blob.lease {
            None => LeaseStatus::Available,
            Some(lease) if lease.is_active(now) => LeaseStatus::Leased,
            Some(_) => LeaseStatus::Expired,
        };
        Ok(BlobProperties {
            size: blob.data.len() as u64,
            etag: Some(format!("\"{}\"", blob.version)),
            lease_status,
        })
    }

    async fn upload_blob(&self, target: &LeaseTarget, data: Bytes) -> BackendResult<()> {
        let now = Instant::now();
        let mut state = self.write()?;
        if !state.containers.contains(&container_key(target)) {
            return Err(BackendError::not_found(
                "ContainerNotFound: The specified container does not exist.",
            ));
        }
        if let Some(existing) = state.blobs.get(target) {
            if existing.lease.as_ref().is_some_and(|l| l.is_active(now)) {
                return Err(BackendError::conflict(
                    "LeaseIdMissing: There is currently a lease on the blob and no lease ID was specified in the request.",
                ));
            }
        }
        let version = state.blobs.get(target).map_or(1, |b| b.version + 1);
        state.blobs.insert(
            target.clone(),
            StoredBlob {
                data,
                version,
                lease: None,
            },
        );
        state.uploads += 1;
        drop(state);
        Ok(())
    }

    async fn acquire_lease(
        &self,
        target: &LeaseTarget,
        proposed: &LeaseToken,
        duration: LeaseDuration,
    ) -> BackendResult<LeaseReceipt> {
        let now = Instant::now();
        let mut state = self.write()?;
        let blob = state
            .blobs
            .get_mut(target)
            .ok_or_else(|| blob_not_found(target))?;

        if let Some(lease) = &blob.lease {
            if lease.is_active(now) && lease.id != *proposed {
                return Err(BackendError::conflict(
                    "LeaseAlreadyPresent: There is already a lease present.",
                ));
            }
        }

        blob.lease = Some(LeaseRecord {
            id: proposed.clone(),
            period: duration.as_duration(),
            expires_at: now + duration.as_duration(),
        });
        drop(state);

        Ok(LeaseReceipt {
            lease_id: proposed.clone(),
            request_id: request_id(),
        })
    }

    async fn renew_lease(
        &self,
        target: &LeaseTarget,
        token: &LeaseToken,
    ) -> BackendResult<LeaseReceipt> {
        let now = Instant::now();
        let mut state = self.write()?;
        let blob = state
            .blobs
            .get_mut(target)
            .ok_or_else(|| blob_not_found(target))?;

        let Some(lease) = blob.lease.as_mut() else {
            return Err(BackendError::conflict(
                "LeaseNotPresentWithLeaseOperation: There is currently no lease on the blob.",
            ));
        };
        if lease.id != *token {
            return Err(BackendError::conflict(
                "LeaseIdMismatchWithLeaseOperation: The lease ID specified did not match the lease ID for the blob.",
            ));
        }

        // Renewal restarts the clock with the duration given at acquisition.
        lease.expires_at = now + lease.period;
        let lease_id = lease.id.clone();
        drop(state);

        Ok(LeaseReceipt {
            lease_id,
            request_id: request_id(),
        })
    }
}
