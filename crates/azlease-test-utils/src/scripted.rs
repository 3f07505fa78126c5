//! Lease backend with scripted responses.
//!
//! Every call is recorded as a [`BackendOp`]. Lease calls succeed unless a
//! failure was queued for them; queued failures are consumed in order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use azlease_core::backend::{BlobProperties, LeaseBackend, LeaseReceipt};
use azlease_core::error::{BackendError, BackendResult};
use azlease_core::params::LeaseDuration;
use azlease_core::target::{LeaseTarget, LeaseToken};
use bytes::Bytes;

/// Record of a backend call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    /// Reachability check.
    Probe,
    /// Container properties read.
    ContainerProperties,
    /// Container creation.
    CreateContainer,
    /// Blob properties read.
    BlobProperties,
    /// Blob upload.
    UploadBlob {
        /// Uploaded size in bytes.
        size: usize,
    },
    /// Lease acquisition.
    AcquireLease {
        /// Proposed lease id.
        proposed: LeaseToken,
        /// Requested duration in seconds.
        duration_secs: u32,
    },
    /// Lease renewal.
    RenewLease {
        /// Lease id presented.
        token: LeaseToken,
    },
}

/// Lease backend whose answers are set up by the test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    operations: Arc<Mutex<Vec<BackendOp>>>,
    script: Arc<Mutex<Script>>,
}

#[derive(Debug, Default)]
struct Script {
    probe_error: Option<BackendError>,
    container_error: Option<BackendError>,
    create_container_error: Option<BackendError>,
    blob_error: Option<BackendError>,
    upload_error: Option<BackendError>,
    acquire: VecDeque<BackendError>,
    renew: VecDeque<Option<BackendError>>,
}

impl ScriptedBackend {
    /// Creates a backend where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<BackendOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Recorded acquire calls.
    #[must_use]
    pub fn acquire_calls(&self) -> Vec<BackendOp> {
        self.operations()
            .into_iter()
            .filter(|op| matches!(op, BackendOp::AcquireLease { .. }))
            .collect()
    }

    /// Recorded renew calls.
    #[must_use]
    pub fn renew_calls(&self) -> Vec<BackendOp> {
        self.operations()
            .into_iter()
            .filter(|op| matches!(op, BackendOp::RenewLease { .. }))
            .collect()
    }

    /// Makes the reachability check fail.
    pub fn fail_probe(&self, error: BackendError) {
        self.script.lock().expect("lock").probe_error = Some(error);
    }

    /// Makes the container properties read fail.
    pub fn fail_container_properties(&self, error: BackendError) {
        self.script.lock().expect("lock").container_error = Some(error);
    }

    /// Makes container creation fail.
    pub fn fail_create_container(&self, error: BackendError) {
        self.script.lock().expect("lock").create_container_error = Some(error);
    }

    /// Makes the blob properties read fail.
    pub fn fail_blob_properties(&self, error: BackendError) {
        self.script.lock().expect("lock").blob_error = Some(error);
    }

    /// Makes blob upload fail.
    pub fn fail_upload(&self, error: BackendError) {
        self.script.lock().expect("lock").upload_error = Some(error);
    }

    /// Queues `count` acquire failures, messages suffixed with the attempt number.
    pub fn script_acquire_failures(&self, count: usize, code: &str) {
        let mut script = self.script.lock().expect("lock");
        for n in 1..=count {
            script
                .acquire
                .push_back(BackendError::conflict(format!("{code}: attempt {n}")));
        }
    }

    /// Lets the first `successes` renewals succeed, then fails the next one.
    pub fn script_renew_failure_after(&self, successes: usize, error: BackendError) {
        let mut script = self.script.lock().expect("lock");
        script.renew.extend(std::iter::repeat_n(None, successes));
        script.renew.push_back(Some(error));
    }

    fn record(&self, op: BackendOp) {
        self.operations.lock().expect("lock").push(op);
    }

    fn preset(&self, pick: impl FnOnce(&Script) -> &Option<BackendError>) -> BackendResult<()> {
        let script = self.script.lock().expect("lock");
        match pick(&script) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait::async_trait]
impl LeaseBackend for ScriptedBackend {
    async fn probe(&self, _target: &LeaseTarget) -> BackendResult<String> {
        self.record(BackendOp::Probe);
        self.preset(|s| &s.probe_error)?;
        Ok("https://testaccount.blob.core.windows.net/".to_string())
    }

    async fn container_properties(&self, _target: &LeaseTarget) -> BackendResult<()> {
        self.record(BackendOp::ContainerProperties);
        self.preset(|s| &s.container_error)
    }

    async fn create_container(&self, _target: &LeaseTarget) -> BackendResult<()> {
        self.record(BackendOp::CreateContainer);
        self.preset(|s| &s.create_container_error)
    }

    async fn blob_properties(&self, _target: &LeaseTarget) -> BackendResult<BlobProperties> {
        self.record(BackendOp::BlobProperties);
        self.preset(|s| &s.blob_error)?;
        Ok(BlobProperties {
            size: 1024,
            ..BlobProperties::default()
        })
    }

    async fn upload_blob(&self, _target: &LeaseTarget, data: Bytes) -> BackendResult<()> {
        self.record(BackendOp::UploadBlob { size: data.len() });
        self.preset(|s| &s.upload_error)
    }

    async fn acquire_lease(
        &self,
        _target: &LeaseTarget,
        proposed: &LeaseToken,
        duration: LeaseDuration,
    ) -> BackendResult<LeaseReceipt> {
        self.record(BackendOp::AcquireLease {
            proposed: proposed.clone(),
            duration_secs: duration.as_secs(),
        });
        if let Some(error) = self.script.lock().expect("lock").acquire.pop_front() {
            return Err(error);
        }
        Ok(LeaseReceipt {
            lease_id: proposed.clone(),
            request_id: request_id(),
        })
    }

    async fn renew_lease(
        &self,
        _target: &LeaseTarget,
        token: &LeaseToken,
    ) -> BackendResult<LeaseReceipt> {
        self.record(BackendOp::RenewLease {
            token: token.clone(),
        });
        if let Some(Some(error)) = self.script.lock().expect("lock").renew.pop_front() {
            return Err(error);
        }
        Ok(LeaseReceipt {
            lease_id: token.clone(),
            request_id: request_id(),
        })
    }
}
