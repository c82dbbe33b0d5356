use crate::config::RedisConfig;
use crate::store::IdempotencyStore;
use crate::{Error, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::RedisError;
use std::time::Duration;
use tracing::info;

/// Redis-backed idempotency store.
///
/// Wraps a [`ConnectionManager`], which reconnects on its own; clones share
/// the underlying connection.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connects to Redis, bounded by the configured connect timeout.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let deadline = Duration::from_secs(config.connect_timeout_secs);

        let connection = tokio::time::timeout(deadline, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::Timeout {
                message: format!("Redis connection not established within {:?}", deadline),
            })??;

        info!("Connected to Redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl IdempotencyStore for RedisStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection.clone();

        // SET with both EX and NX: reply is OK when set, nil when the key
        // already existed.
        let reply: std::result::Result<Option<String>, RedisError> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs())
            .arg("NX")
            .query_async(&mut conn)
            .await;

        Ok(reply?.is_some())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
