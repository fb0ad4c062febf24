use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Core modules in dependency order. Anything not listed here is never
/// initialized as a core module, even if registered as one.
const CORE_MODULE_ORDER: &[&str] = &[
    "db",    // Relational store
    "cache", // Cache gateway
];

#[derive(Debug, Clone, Copy)]
enum Phase {
    Init,
    Start,
}

impl Phase {
    fn verb(self) -> &'static str {
        match self {
            Phase::Init => "initialize",
            Phase::Start => "start",
        }
    }
}

/// Owns every registered module and drives their lifecycle.
#[derive(Default)]
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// Core modules first, then custom modules in registration order.
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .chain(self.custom_modules.iter())
            .collect()
    }

    /// Custom (domain) modules in registration order.
    pub fn custom_modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.custom_modules.iter()
    }

    fn ordered_core_modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        CORE_MODULE_ORDER.iter().filter_map(|&name| {
            self.core_modules
                .iter()
                .find(|module| module.name() == name)
        })
    }

    async fn run_phase<'m>(
        modules: impl Iterator<Item = &'m Arc<dyn Module>>,
        phase: Phase,
        kind: &str,
        ctx: &InitCtx<'_>,
    ) -> anyhow::Result<()> {
        for module in modules {
            tracing::info!(module = module.name(), kind, phase = ?phase, "module lifecycle");

            let outcome = match phase {
                Phase::Init => module.init(ctx).await,
                Phase::Start => module.start(ctx).await,
            };
            outcome.with_context(|| {
                format!("failed to {} {kind} module '{}'", phase.verb(), module.name())
            })?;
        }
        Ok(())
    }

    pub async fn init_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Self::run_phase(self.ordered_core_modules(), Phase::Init, "core", ctx).await
    }

    pub async fn init_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Self::run_phase(self.custom_modules.iter(), Phase::Init, "custom", ctx).await
    }

    pub async fn start_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Self::run_phase(self.ordered_core_modules(), Phase::Start, "core", ctx).await
    }

    pub async fn start_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Self::run_phase(self.custom_modules.iter(), Phase::Start, "custom", ctx).await
    }

    /// Stop custom modules in reverse registration order.
    pub async fn stop_custom_modules(&self) -> anyhow::Result<()> {
        for module in self.custom_modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping custom module");
            module
                .stop()
                .await
                .with_context(|| format!("failed to stop custom module '{}'", module.name()))?;
        }
        Ok(())
    }

    /// Stop core modules in reverse dependency order.
    pub async fn stop_core_modules(&self) -> anyhow::Result<()> {
        let ordered: Vec<_> = self.ordered_core_modules().collect();
        for module in ordered.into_iter().rev() {
            tracing::info!(module = module.name(), "stopping core module");
            module
                .stop()
                .await
                .with_context(|| format!("failed to stop core module '{}'", module.name()))?;
        }
        Ok(())
    }

    /// Migrations from every module, tagged with the owning module name.
    ///
    /// Modules are visited core first, then custom in registration order, so
    /// a module registered after another may reference its tables. Within a
    /// module, migrations keep the order the module returned them in.
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        self.modules()
            .into_iter()
            .flat_map(|module| {
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (module.name().to_string(), migration))
            })
            .collect()
    }
}
