//! Lease blob provisioning.
//!
//! Makes sure a leasable blob exists at the target. Creation is idempotent and
//! never overwrites: an existing blob is reported as
//! [`Outcome::AlreadyExists`] and left untouched.
//!
//! # How It Works
//!
//! 1. Read container properties; create the container only on `NotFound`
//! 2. Read blob properties; upload a random placeholder only on `NotFound`
//! 3. Any other backend failure ends provisioning with [`Outcome::Failed`]
//!
//! The placeholder content has no meaning. Its only purpose is to give the
//! backend an object to lease.

use std::sync::Arc;

use bytes::Bytes;
use rand::Rng;
use tracing::Instrument;

use crate::backend::LeaseBackend;
use crate::config::EngineConfig;
use crate::observability::lease_span;
use crate::result::{Operation, Outcome};
use crate::target::LeaseTarget;

/// Creates the lease blob if it is missing.
pub struct LeaseTargetProvisioner<B: LeaseBackend + ?Sized> {
    backend: Arc<B>,
    placeholder_size: usize,
}

impl<B: LeaseBackend + ?Sized> LeaseTargetProvisioner<B> {
    /// Creates a provisioner.
    #[must_use]
    pub fn new(backend: Arc<B>, config: &EngineConfig) -> Self {
        Self {
            backend,
            placeholder_size: config.placeholder_size,
        }
    }

    /// Ensures the container and blob exist.
    ///
    /// Performs at most one container creation and one upload. No retries.
    pub async fn provision(&self, target: &LeaseTarget) -> Outcome {
        self.provision_inner(target)
            .instrument(lease_span(Operation::CreateLeaseBlob, target))
            .await
    }

    async fn provision_inner(&self, target: &LeaseTarget) -> Outcome {
        match self.backend.container_properties(target).await {
            Ok(()) => tracing::debug!("container already exists"),
            Err(e) if e.is_not_found() => {
                tracing::info!("container not found, creating it");
                if let Err(e) = self.backend.create_container(target).await {
                    tracing::error!(error = %e, "an error occurred trying to create container");
                    return Outcome::Failed(e.message);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "an error occurred while checking if container exists");
                return Outcome::Failed(e.message);
            }
        }

        match self.backend.blob_properties(target).await {
            Ok(props) => {
                tracing::info!(
                    size = props.size,
                    etag = props.etag.as_deref().unwrap_or_default(),
                    lease_status = ?props.lease_status,
                    "lease blob already exists"
                );
                Outcome::AlreadyExists
            }
            Err(e) if e.is_not_found() => {
                let data = placeholder(self.placeholder_size);
                match self.backend.upload_blob(target, data).await {
                    Ok(()) => {
                        tracing::info!(size = self.placeholder_size, "lease blob created");
                        Outcome::Provisioned
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "an error occurred while uploading lease blob");
                        Outcome::Failed(e.message)
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "an error occurred while checking if blob exists");
                Outcome::Failed(e.message)
            }
        }
    }
}

fn placeholder(size: usize) -> Bytes {
    let mut data = vec![0_u8; size];
    rand::thread_rng().fill(&mut data[..]);
    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LeaseStatus;
    use crate::memory::MemoryLeaseBackend;
    use crate::params::LeaseDuration;
    use crate::target::{AccountCoordinates, LeaseToken};

    fn target() -> LeaseTarget {
        let account = AccountCoordinates::new("sub", "rg", "acct").unwrap();
        LeaseTarget::new(account, "leases", "azblobleaseblob").unwrap()
    }

    #[tokio::test]
    async fn provisioning_is_idempotent() {
        let backend = Arc::new(MemoryLeaseBackend::new());
        let provisioner = LeaseTargetProvisioner::new(backend.clone(), &EngineConfig::default());

        assert_eq!(provisioner.provision(&target()).await, Outcome::Provisioned);
        let content = backend.blob_content(&target()).unwrap();
        assert_eq!(content.len(), 1024);

        assert_eq!(provisioner.provision(&target()).await, Outcome::AlreadyExists);
        assert_eq!(backend.blob_content(&target()).unwrap(), content);
        assert_eq!(backend.upload_count(), 1);
    }

    #[tokio::test]
    async fn leased_blob_is_left_alone() {
        let backend = Arc::new(MemoryLeaseBackend::new());
        let provisioner = LeaseTargetProvisioner::new(backend.clone(), &EngineConfig::default());
        provisioner.provision(&target()).await;
        let holder = LeaseToken::generate();
        backend
            .acquire_lease(&target(), &holder, LeaseDuration::default())
            .await
            .unwrap();
        let props = backend.blob_properties(&target()).await.unwrap();
        assert_eq!(props.lease_status, LeaseStatus::Leased);

        assert_eq!(provisioner.provision(&target()).await, Outcome::AlreadyExists);
        assert_eq!(backend.upload_count(), 1);
        assert_eq!(backend.active_holder(&target()), Some(holder));
        assert_eq!(backend.blob_properties(&target()).await.unwrap().etag, props.etag);
    }

    #[tokio::test]
    async fn placeholder_size_follows_config() {
        let backend = Arc::new(MemoryLeaseBackend::new());
        let config = EngineConfig::default().with_placeholder_size(8);
        let provisioner = LeaseTargetProvisioner::new(backend.clone(), &config);
        provisioner.provision(&target()).await;
        assert_eq!(backend.blob_content(&target()).unwrap().len(), 8);
    }
}
