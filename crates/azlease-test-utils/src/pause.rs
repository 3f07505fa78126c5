//! Pause implementation that never sleeps.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use azlease_core::pause::Pause;

/// Records requested pauses instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingPause {
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPause {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every requested pause in order.
    #[must_use]
    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().expect("lock").clone()
    }

    /// Number of pauses requested so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.requested.lock().expect("lock").len()
    }
}

#[async_trait::async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.requested.lock().expect("lock").push(duration);
    }
}
