use std::sync::Arc;

use tracing::warn;

use council::coordinator::Coordinator;
use council::council::CouncilOrchestrator;
use council::providers::base::ProviderConfig;
use council::providers::factory;

/// Shared router state: the provider credentials loaded at startup. A fresh
/// coordinator and orchestrator are built per request so advisor assignments
/// and hidden agendas never leak across sessions.
#[derive(Clone)]
pub struct AppState {
    provider_configs: Vec<ProviderConfig>,
}

impl AppState {
    pub fn new(provider_configs: Vec<ProviderConfig>) -> Arc<Self> {
        Arc::new(Self { provider_configs })
    }

    /// Build an orchestrator over every config that yields a working
    /// adapter. Unknown provider names are logged and skipped; having zero
    /// usable providers surfaces as `Misconfigured` at session start.
    pub fn build_orchestrator(&self) -> Arc<CouncilOrchestrator> {
        let mut coordinator = Coordinator::new();
        for config in &self.provider_configs {
            match factory::create(config) {
                Ok(adapter) => coordinator.add_adapter(adapter),
                Err(error) => {
                    warn!(
                        provider = %config.provider,
                        kind = error.kind(),
                        "skipping provider: {}",
                        error
                    );
                }
            }
        }
        Arc::new(CouncilOrchestrator::new(coordinator))
    }
}
