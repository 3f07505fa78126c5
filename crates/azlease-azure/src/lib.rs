//! # azlease-azure
//!
//! Azure collaborators for the lease engine:
//!
//! - **Clouds** ([`cloud`]): built-in sovereign clouds and custom cloud files
//! - **Credentials** ([`credential`]): token sources and the default chain
//! - **Backend** ([`backend`]): [`AzureBlobBackend`], the REST implementation
//!   of [`azlease_core::LeaseBackend`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod backend;
pub mod cloud;
pub mod credential;
pub mod error;

pub use backend::{AzureBlobBackend, http_client};
pub use cloud::{CloudDescriptor, CloudEnvironment};
pub use credential::{
    AccessToken, CredentialSelection, ManagedIdentityId, TokenCredential, resolve_credential,
};
pub use error::{CloudConfigError, CredentialError};
