//! Waiting between status checks

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something that can wait
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Waits on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested wait
#[derive(Debug, Clone, Default)]
pub struct InstantSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl InstantSleeper {
    /// Create a sleeper with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits requested so far
    pub fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .map(|w| w.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_sleeper_records() {
        let sleeper = InstantSleeper::new();
        let shared = sleeper.clone();

        tokio_test::block_on(async {
            sleeper.sleep(Duration::from_secs(2)).await;
            sleeper.sleep(Duration::from_secs(2)).await;
        });

        assert_eq!(shared.waits(), vec![Duration::from_secs(2); 2]);
    }
}
