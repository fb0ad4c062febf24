use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use library_kernel::{InitCtx, Module};

use crate::typed::Cache;

/// Core module wrapping the cache gateway so it participates in the
/// registry lifecycle.
pub struct CacheModule {
    cache: Cache,
}

impl CacheModule {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Module for CacheModule {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.cache
            .ping()
            .await
            .context("cache backend did not answer ping")?;
        tracing::info!(
            module = self.name(),
            backend = ?ctx.settings.cache.backend,
            "cache module initialized"
        );
        Ok(())
    }
}

pub fn create_module(cache: Cache) -> Arc<dyn Module> {
    Arc::new(CacheModule::new(cache))
}
