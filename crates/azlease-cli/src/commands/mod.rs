//! CLI command implementations.

pub mod acquire;
pub mod common;
pub mod createleaseblob;
pub mod renew;
