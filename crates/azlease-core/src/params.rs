//! Validated numeric parameters for acquisition and renewal.
//!
//! Every bound is checked when the value is built, so an engine call can
//! never start with an out-of-range duration, retry budget or wait time.
//! Values arrive as `i64` because callers may hand over negative input.

use std::time::Duration;

use crate::error::ValidationError;

/// Requested lease duration, `[15, 60]` seconds.
///
/// Infinite leases (`-1` on the wire) are deliberately unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseDuration(u32);

impl LeaseDuration {
    /// Shortest lease the backend grants.
    pub const MIN_SECS: i64 = 15;
    /// Longest finite lease the backend grants.
    pub const MAX_SECS: i64 = 60;

    /// Validates a duration in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::LeaseDuration`] when out of range.
    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        if let Some(secs) = bounded(secs, Self::MIN_SECS, Self::MAX_SECS) {
            Ok(Self(secs))
        } else {
            Err(ValidationError::LeaseDuration {
                value: secs,
                min: Self::MIN_SECS,
                max: Self::MAX_SECS,
            })
        }
    }

    /// Duration in whole seconds.
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Duration as [`Duration`].
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for LeaseDuration {
    fn default() -> Self {
        Self(60)
    }
}

/// Number of acquisition attempts, at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget(u32);

impl RetryBudget {
    /// Validates a retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RetryCount`] when below one or above
    /// `u32::MAX`.
    pub fn new(attempts: i64) -> Result<Self, ValidationError> {
        bounded(attempts, 1, i64::from(u32::MAX))
            .map(Self)
            .ok_or(ValidationError::RetryCount { value: attempts })
    }

    /// Number of attempts.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self(1)
    }
}

/// Pause between acquisition attempts, `[0, 59]` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcquireWait(u32);

impl AcquireWait {
    /// Inclusive lower bound.
    pub const MIN_SECS: i64 = 0;
    /// Inclusive upper bound.
    pub const MAX_SECS: i64 = 59;

    /// Validates a wait in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AcquireWait`] when out of range.
    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        if let Some(secs) = bounded(secs, Self::MIN_SECS, Self::MAX_SECS) {
            Ok(Self(secs))
        } else {
            Err(ValidationError::AcquireWait {
                value: secs,
                min: Self::MIN_SECS,
                max: Self::MAX_SECS,
            })
        }
    }

    /// Wait as [`Duration`].
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

/// Number of renewal iterations, at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationCount(u32);

impl IterationCount {
    /// Validates an iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IterationCount`] when below one or above
    /// `u32::MAX`.
    pub fn new(iterations: i64) -> Result<Self, ValidationError> {
        bounded(iterations, 1, i64::from(u32::MAX))
            .map(Self)
            .ok_or(ValidationError::IterationCount { value: iterations })
    }

    /// Number of iterations.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for IterationCount {
    fn default() -> Self {
        Self(20)
    }
}

/// Pause between renewal iterations, `[1, 59]` seconds.
///
/// Ideally about half of the lease duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewWait(u32);

impl RenewWait {
    /// Inclusive lower bound.
    pub const MIN_SECS: i64 = 1;
    /// Inclusive upper bound.
    pub const MAX_SECS: i64 = 59;

    /// Validates a wait in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RenewWait`] when out of range.
    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        if let Some(secs) = bounded(secs, Self::MIN_SECS, Self::MAX_SECS) {
            Ok(Self(secs))
        } else {
            Err(ValidationError::RenewWait {
                value: secs,
                min: Self::MIN_SECS,
                max: Self::MAX_SECS,
            })
        }
    }

    /// Wait as [`Duration`].
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for RenewWait {
    fn default() -> Self {
        Self(30)
    }
}

/// `value` as `u32` when inside `[min, max]`.
fn bounded(value: i64, min: i64, max: i64) -> Option<u32> {
    if (min..=max).contains(&value) {
        u32::try_from(value).ok()
    } else {
        None
    }
}
