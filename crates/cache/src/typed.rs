use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::CacheResult;
use crate::keys::{CacheKey, TtlPolicy};
use crate::memory::InMemoryStore;
use crate::store::CacheStore;

/// Typed JSON view over a [`CacheStore`].
///
/// Reads never fail: backend errors and undecodable payloads are logged and
/// reported as a miss. Writes and removals are best effort and only logged.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    policy: TtlPolicy,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, policy: TtlPolicy) -> Self {
        Self { store, policy }
    }

    /// Process-local cache with the default policy.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), TtlPolicy::default())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = match self.store.get(&key.to_string()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %key, "cache miss");
                return None;
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cached value did not decode; treating as miss");
                None
            }
        }
    }

    /// Store `value` under `key` with the TTL of the key's namespace.
    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let ttl = self.policy.ttl(key.namespace());
        self.set_with_ttl(key, value, ttl).await;
    }

    async fn set_with_ttl<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        if let Err(err) = self.try_set(key, value, ttl).await {
            tracing::warn!(key = %key, error = %err, "cache write failed");
        }
    }

    async fn try_set<T: Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(&key.to_string(), raw, ttl).await
    }

    pub async fn remove(&self, key: &CacheKey) {
        if let Err(err) = self.store.remove(&key.to_string()).await {
            tracing::warn!(key = %key, error = %err, "cache invalidation failed");
        }
    }

    pub async fn ping(&self) -> CacheResult<()> {
        self.store.ping().await
    }
}
