//! # azlease-core
//!
//! Lease lifecycle engine for leader election on top of blob leases.
//!
//! Independent processes race to hold a time-bounded lease on a shared blob.
//! The storage service's conditional lease primitives are the only source of
//! mutual exclusion; this crate contributes no locking of its own.
//!
//! - **Provisioning** ([`provision`]): idempotent create-if-absent of the lease blob
//! - **Acquisition** ([`acquire`]): bounded retries, first success wins
//! - **Renewal** ([`renew`]): fixed number of iterations at a fixed interval
//! - **Results** ([`result`]): the one structured record every invocation prints
//!
//! The engine is stateless across invocations. The lease token returned by
//! acquisition is all a later renewal needs.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod acquire;
pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod memory;
pub mod observability;
pub mod params;
pub mod pause;
pub mod provision;
pub mod renew;
pub mod result;
pub mod target;

/// Crate version, reported by the `version` command.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::acquire::{AcquireRequest, LeaseAcquirer};
    pub use crate::backend::{BlobProperties, LeaseBackend, LeaseReceipt, LeaseStatus};
    pub use crate::config::EngineConfig;
    pub use crate::diagnostics::{DiagnosticSink, RenewalDiagnostic, StderrDiagnostics};
    pub use crate::error::{BackendError, BackendErrorKind, BackendResult, ValidationError};
    pub use crate::params::{AcquireWait, IterationCount, LeaseDuration, RenewWait, RetryBudget};
    pub use crate::pause::{Pause, TokioPause};
    pub use crate::provision::LeaseTargetProvisioner;
    pub use crate::renew::{LeaseRenewer, RenewRequest};
    pub use crate::result::{Operation, OperationResult, OperationStatus, Outcome};
    pub use crate::target::{AccountCoordinates, LeaseTarget, LeaseToken};
}

// Re-export key types at crate root for ergonomics
pub use acquire::{AcquireRequest, LeaseAcquirer};
pub use backend::{BlobProperties, LeaseBackend, LeaseReceipt, LeaseStatus};
pub use config::EngineConfig;
pub use diagnostics::{CollectedDiagnostics, DiagnosticSink, RenewalDiagnostic, StderrDiagnostics};
pub use error::{BackendError, BackendErrorKind, BackendResult, ValidationError};
pub use memory::MemoryLeaseBackend;
pub use observability::{LogFormat, init_logging, lease_span};
pub use params::{AcquireWait, IterationCount, LeaseDuration, RenewWait, RetryBudget};
pub use pause::{Pause, TokioPause};
pub use provision::LeaseTargetProvisioner;
pub use renew::{LeaseRenewer, RenewRequest};
pub use result::{Operation, OperationResult, OperationStatus, Outcome};
pub use target::{AccountCoordinates, DEFAULT_BLOB_NAME, LeaseTarget, LeaseToken};
