use crate::store::IdempotencyStore;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// In-memory idempotency store with per-key expiry.
///
/// Test stand-in for [`RedisStore`](crate::store::RedisStore). Uses tokio's
/// clock, so `set_if_absent` honors `tokio::time::advance` under paused time.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub fn live_keys(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|expires| **expires > now)
            .count()
    }
}

#[async_trait]
impl IdempotencyStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, _value: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();

        if let Some(expires) = entries.get(key) {
            if *expires > now {
                return Ok(false);
            }
        }

        entries.insert(key.to_string(), now + ttl);
        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
