//! Process bootstrap: wire backends into modules and drive the lifecycle.

use anyhow::Context;
use library_cache::Cache;
use library_kernel::settings::Settings;
use library_kernel::{InitCtx, ModuleRegistry};
use sqlx::PgPool;

use crate::modules::{register_all, ModuleDeps};

/// Registry holding the `db` and `cache` core modules plus every domain
/// module, all sharing `pool` and `cache`.
pub fn build_registry(pool: PgPool, cache: Cache) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_core(library_db::create_module(pool.clone()));
    registry.register_core(library_cache::create_module(cache.clone()));
    register_all(&mut registry, &ModuleDeps::postgres(pool, cache));
    registry
}

/// Connect, migrate (when enabled), serve HTTP until shutdown, then stop
/// every module.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let pool = library_db::connect(&settings.database).await?;
    let cache = library_cache::connect(&settings.cache).await?;
    let registry = build_registry(pool.clone(), cache);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;

    if settings.database.run_migrations {
        let applied = library_db::apply_migrations(&pool, &registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations complete");
    } else {
        tracing::info!("migrations disabled by configuration");
    }

    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    let served = library_http::start_server(&registry, &settings).await;

    if let Err(err) = registry.stop_custom_modules().await {
        tracing::warn!(error = %err, "custom module shutdown reported an error");
    }
    if let Err(err) = registry.stop_core_modules().await {
        tracing::warn!(error = %err, "core module shutdown reported an error");
    }
    served
}

/// Apply pending migrations and exit. The cache is never contacted.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = library_db::connect(&settings.database).await?;
    let registry = build_registry(pool.clone(), Cache::in_memory());

    let applied = library_db::apply_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    pool.close().await;

    tracing::info!(applied, "migrations complete");
    Ok(applied)
}
