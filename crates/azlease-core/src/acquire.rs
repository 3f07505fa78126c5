//! Lease acquisition with a bounded retry budget.
//!
//! # How It Works
//!
//! 1. One [`LeaseToken`] is generated for the whole session; every attempt
//!    proposes the same id
//! 2. The target is probed once; an unreachable target fails without retries
//! 3. Up to `retries` attempts call the backend's conditional acquire; the first
//!    success ends the loop
//! 4. Between failed attempts the acquirer pauses for `wait`
//!
//! A lease held by another process fails in the same way as a transient
//! error and is retried the same way. Only the last failure message is kept.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use azlease_core::acquire::{AcquireRequest, LeaseAcquirer};
//! use azlease_core::memory::MemoryLeaseBackend;
//! use azlease_core::pause::TokioPause;
//! use azlease_core::provision::LeaseTargetProvisioner;
//! use azlease_core::result::Outcome;
//! use azlease_core::target::{AccountCoordinates, LeaseTarget};
//! use azlease_core::EngineConfig;
//!
//! # tokio_test::block_on(async {
//! let backend = Arc::new(MemoryLeaseBackend::new());
//! let account = AccountCoordinates::new("sub", "rg", "acct").unwrap();
//! let target = LeaseTarget::new(account, "leases", "azblobleaseblob").unwrap();
//!
//! LeaseTargetProvisioner::new(backend.clone(), &EngineConfig::default())
//!     .provision(&target)
//!     .await;
//!
//! let acquirer = LeaseAcquirer::new(backend, Arc::new(TokioPause));
//! let outcome = acquirer.acquire(&target, AcquireRequest::default()).await;
//! assert!(matches!(outcome, Outcome::Acquired(_)));
//! # });
//! ```

use std::sync::Arc;

use tracing::Instrument;

use crate::backend::LeaseBackend;
use crate::observability::lease_span;
use crate::params::{AcquireWait, LeaseDuration, RetryBudget};
use crate::pause::Pause;
use crate::result::{Operation, Outcome};
use crate::target::{LeaseTarget, LeaseToken};

/// Parameters of one acquisition session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquireRequest {
    /// Requested lease duration.
    pub duration: LeaseDuration,
    /// Maximum number of attempts.
    pub retries: RetryBudget,
    /// Pause between attempts.
    pub wait: AcquireWait,
}

/// Tries to become the sole holder of a lease.
pub struct LeaseAcquirer<B: LeaseBackend + ?Sized> {
    backend: Arc<B>,
    pause: Arc<dyn Pause>,
}

impl<B: LeaseBackend + ?Sized> LeaseAcquirer<B> {
    /// Creates an acquirer.
    #[must_use]
    pub fn new(backend: Arc<B>, pause: Arc<dyn Pause>) -> Self {
        Self { backend, pause }
    }

    /// Runs one acquisition session with a freshly generated token.
    pub async fn acquire(&self, target: &LeaseTarget, request: AcquireRequest) -> Outcome {
        let proposed = LeaseToken::generate();
        self.acquire_inner(target, proposed, request)
            .instrument(lease_span(Operation::Acquire, target))
            .await
    }

    async fn acquire_inner(
        &self,
        target: &LeaseTarget,
        proposed: LeaseToken,
        request: AcquireRequest,
    ) -> Outcome {
        match self.backend.probe(target).await {
            Ok(endpoint) => tracing::debug!(%endpoint, "target reachable"),
            Err(e) => {
                tracing::error!(error = %e, "an error occurred while resolving the lease target");
                return Outcome::Failed(e.message);
            }
        }

        let attempts = request.retries.get();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self
                .backend
                .acquire_lease(target, &proposed, request.duration)
                .await
            {
                Ok(receipt) => {
                    tracing::info!(
                        attempt,
                        lease_id = %proposed,
                        request_id = %receipt.request_id,
                        duration_secs = request.duration.as_secs(),
                        "lease acquired"
                    );
                    return Outcome::Acquired(proposed);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        attempts,
                        kind = %e.kind,
                        error = %e,
                        "an error occurred while acquiring lease"
                    );
                    last_error = e.message;
                }
            }

            if attempt < attempts {
                self.pause.pause(request.wait.as_duration()).await;
            }
        }

        Outcome::Failed(last_error)
    }
}
