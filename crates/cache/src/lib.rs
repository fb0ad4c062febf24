//! Cache gateway for the library service.
//!
//! Values are stored as JSON text under namespaced keys with a per-namespace
//! TTL. Reads treat every failure as a miss; writes are best effort.

mod error;
mod keys;
mod memory;
mod module;
mod redis_store;
mod store;
mod typed;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, Namespace, TtlPolicy};
pub use memory::InMemoryStore;
pub use module::{create_module, CacheModule};
pub use redis_store::RedisStore;
pub use store::CacheStore;
pub use typed::Cache;

use std::sync::Arc;

use anyhow::Context;
use library_kernel::settings::{CacheBackend, CacheSettings};

/// Build the configured cache backend and wrap it with the TTL policy.
pub async fn connect(settings: &CacheSettings) -> anyhow::Result<Cache> {
    let policy = TtlPolicy::from_settings(settings);

    let store: Arc<dyn CacheStore> = match settings.backend {
        CacheBackend::Redis => {
            let store = RedisStore::connect(&settings.url, &settings.key_prefix)
                .await
                .with_context(|| format!("failed to connect to redis at {}", settings.url))?;
            Arc::new(store)
        }
        CacheBackend::Memory => Arc::new(InMemoryStore::new()),
    };

    tracing::info!(backend = ?settings.backend, "cache gateway ready");
    Ok(Cache::new(store, policy))
}
