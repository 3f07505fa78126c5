//! Pre-built lease targets.

use azlease_core::target::{AccountCoordinates, DEFAULT_BLOB_NAME, LeaseTarget};

/// Subscription id used by [`test_target`].
pub const TEST_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Account coordinates with fixed test values.
pub fn test_account() -> AccountCoordinates {
    AccountCoordinates::new(TEST_SUBSCRIPTION, "test-rg", "testaccount").expect("valid account")
}

/// Lease target in the `leases` container with the default blob name.
pub fn test_target() -> LeaseTarget {
    LeaseTarget::new(test_account(), "leases", DEFAULT_BLOB_NAME).expect("valid target")
}

/// Lease target with a unique container, for tests sharing one backend.
pub fn unique_target() -> LeaseTarget {
    let container = format!("leases-{}", uuid::Uuid::new_v4().as_simple());
    LeaseTarget::new(test_account(), container, DEFAULT_BLOB_NAME).expect("valid target")
}
