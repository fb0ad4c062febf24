use async_trait::async_trait;
use axum::Router;

/// Context handed to modules during the init and start phases.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// A forward-only SQL migration contributed by a module.
///
/// Migrations are identified by `(module name, id)` and applied at most once.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Unit of composition for the service.
///
/// Core modules (`db`, `cache`) own shared infrastructure; custom modules own
/// a slice of the domain and contribute routes, OpenAPI fragments and
/// migrations.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name; also the mount point `/api/{name}`.
    fn name(&self) -> &'static str;

    /// Called during startup, before migrations run.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Router for this module, nested under `/api/{name}`.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` and `components.schemas`) merged into the
    /// service document. Paths are relative to the module mount point.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Migrations in the order they must be applied.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called after migrations are complete.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during shutdown, custom modules first.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
