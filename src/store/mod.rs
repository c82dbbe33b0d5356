//! Idempotency store used to suppress duplicate messages.
//!
//! The router only ever needs one primitive: an atomic set-if-absent with a
//! TTL. [`RedisStore`] backs it with Redis `SET NX EX`; [`MemoryStore`] is a
//! process-local stand-in for tests.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Stores `key` with `value` and expiry `ttl` only if `key` is absent.
    ///
    /// Returns `true` when the key was newly set (the message is first of
    /// its window) and `false` when it already existed. Errors mean the
    /// store could not answer; callers decide the admission policy.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Round-trip health check.
    async fn ping(&self) -> Result<()>;
}
