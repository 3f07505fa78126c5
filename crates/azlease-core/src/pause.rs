//! Waiting between attempts and iterations.
//!
//! Waits go through [`Pause`] so tests can count them instead of sleeping.

use std::time::Duration;

use async_trait::async_trait;

/// Something that can wait for a duration.
#[async_trait]
pub trait Pause: Send + Sync {
    /// Waits for `duration`.
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_pause_returns_immediately() {
        let started = std::time::Instant::now();
        TokioPause.pause(Duration::ZERO).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
