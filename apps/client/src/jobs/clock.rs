use std::time::Duration;

use async_trait::async_trait;

/// Source of the wait between poll attempts.
/// Production uses `TokioClock`; tests inject a clock that records instead of sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
