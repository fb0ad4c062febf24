use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// Raw key/value backend holding serialized text.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    async fn remove(&self, key: &str) -> CacheResult<()>;

    /// Round-trip to the backend; used by the health check.
    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
