//! Fixed-cadence lease renewal.
//!
//! Renews a held lease `iterations` times, pausing `wait` after each success.
//! The first failed renewal ends the loop: a failing renewal almost always
//! means the lease is already gone, and only a fresh acquisition can win it
//! back. Re-acquiring is the caller's job.
//!
//! The loop is finite on purpose. A caller that must stay leader longer than
//! `iterations x wait` re-invokes renewal with the same token before the
//! lease's remaining duration elapses.

use std::sync::Arc;

use tracing::Instrument;

use crate::backend::LeaseBackend;
use crate::diagnostics::{DiagnosticSink, RenewalDiagnostic};
use crate::observability::lease_span;
use crate::params::{IterationCount, RenewWait};
use crate::pause::Pause;
use crate::result::{Operation, Outcome};
use crate::target::{LeaseTarget, LeaseToken};

/// Parameters of one renewal run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenewRequest {
    /// Number of renewals to perform.
    pub iterations: IterationCount,
    /// Pause after each successful renewal.
    pub wait: RenewWait,
}

/// Keeps a held lease alive for a fixed number of iterations.
pub struct LeaseRenewer<B: LeaseBackend + ?Sized> {
    backend: Arc<B>,
    pause: Arc<dyn Pause>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<B: LeaseBackend + ?Sized> LeaseRenewer<B> {
    /// Creates a renewer.
    #[must_use]
    pub fn new(
        backend: Arc<B>,
        pause: Arc<dyn Pause>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            backend,
            pause,
            diagnostics,
        }
    }

    /// Renews the lease held under `token`.
    ///
    /// Returns [`Outcome::Renewed`] with the id last confirmed by the backend
    /// when every iteration succeeds, [`Outcome::Failed`] otherwise.
    pub async fn renew(
        &self,
        target: &LeaseTarget,
        token: &LeaseToken,
        request: RenewRequest,
    ) -> Outcome {
        self.renew_inner(target, token, request)
            .instrument(lease_span(Operation::Renew, target))
            .await
    }

    async fn renew_inner(
        &self,
        target: &LeaseTarget,
        token: &LeaseToken,
        request: RenewRequest,
    ) -> Outcome {
        if let Err(e) = self.backend.probe(target).await {
            tracing::error!(error = %e, "an error occurred while resolving the lease target");
            return Outcome::Failed(e.message);
        }

        let mut confirmed = token.clone();
        for iteration in 0..request.iterations.get() {
            let receipt = match self.backend.renew_lease(target, token).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    tracing::error!(
                        iteration,
                        kind = %e.kind,
                        error = %e,
                        "an error occurred while renewing lease"
                    );
                    return Outcome::Failed(e.message);
                }
            };

            let diagnostic = RenewalDiagnostic {
                iteration,
                lease_id: receipt.lease_id.clone(),
                request_id: receipt.request_id,
            };
            tracing::debug!(%diagnostic, "lease renewed");
            self.diagnostics.emit(&diagnostic);
            confirmed = receipt.lease_id;

            self.pause.pause(request.wait.as_duration()).await;
        }

        Outcome::Renewed(confirmed)
    }
}
