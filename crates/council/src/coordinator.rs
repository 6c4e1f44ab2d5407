use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::message::ProviderResponse;
use crate::providers::base::ProviderAdapter;
use crate::providers::errors::ProviderError;

/// Ordered registry of provider adapters plus the fan-out strategies that
/// run over it. The registry is mutated only during setup; sessions read it
/// through `&self` afterwards.
#[derive(Default)]
pub struct Coordinator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_adapter(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn remove_adapter(&mut self, provider_name: &str) {
        self.adapters
            .retain(|adapter| adapter.provider_name() != provider_name);
    }

    /// Registered names in registry order. This order is the basis for the
    /// orchestrator's round-robin advisor assignment.
    pub fn list_providers(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|adapter| adapter.provider_name().to_string())
            .collect()
    }

    /// Query every adapter concurrently. Each adapter's outcome is captured
    /// independently; one failure never affects another's result. The map
    /// covers every registered provider exactly once.
    pub async fn query_all(
        &self,
        prompt: &str,
    ) -> HashMap<String, Result<ProviderResponse, ProviderError>> {
        let mut tasks = Vec::new();

        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let prompt = prompt.to_string();
            tasks.push(tokio::spawn(async move {
                let name = adapter.provider_name().to_string();
                let result = adapter.send_prompt(&prompt).await;
                (name, result)
            }));
        }

        let mut results = HashMap::new();
        for outcome in futures::future::join_all(tasks).await {
            match outcome {
                Ok((name, result)) => {
                    results.insert(name, result);
                }
                Err(join_error) => {
                    warn!("provider query task failed: {}", join_error);
                }
            }
        }
        results
    }

    /// Same result shape as `query_all`, but one call at a time in registry
    /// order. Used where request ordering or rate considerations matter.
    pub async fn query_sequential(
        &self,
        prompt: &str,
    ) -> HashMap<String, Result<ProviderResponse, ProviderError>> {
        let mut results = HashMap::new();
        for adapter in &self.adapters {
            let result = adapter.send_prompt(prompt).await;
            results.insert(adapter.provider_name().to_string(), result);
        }
        results
    }

    /// Query all adapters concurrently and return the first success,
    /// aborting every other in-flight call. Fails only when the registry is
    /// empty or every adapter fails.
    pub async fn query_race(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        if self.adapters.is_empty() {
            return Err(ProviderError::Misconfigured(
                "no providers registered".to_string(),
            ));
        }

        let mut join_set = JoinSet::new();
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let prompt = prompt.to_string();
            join_set.spawn(async move { adapter.send_prompt(&prompt).await });
        }

        let mut last_error = None;
        while let Some(outcome) = join_set.join_next().await {
            match outcome {
                Ok(Ok(response)) => {
                    debug!(provider = %response.provider, "race winner");
                    join_set.abort_all();
                    return Ok(response);
                }
                Ok(Err(error)) => {
                    warn!(kind = error.kind(), "race entrant failed: {}", error);
                    last_error = Some(error);
                }
                Err(join_error) => {
                    if !join_error.is_cancelled() {
                        warn!("race task failed: {}", join_error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::Transport("all race entrants were cancelled".to_string())
        }))
    }

    /// Call only the first registered adapter.
    pub async fn query_first(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        let adapter = self.adapters.first().ok_or_else(|| {
            ProviderError::Misconfigured("no providers registered".to_string())
        })?;
        adapter.send_prompt(prompt).await
    }

    /// Call exactly the named adapter.
    pub async fn query_specific(
        &self,
        provider_name: &str,
        prompt: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let adapter = self
            .adapters
            .iter()
            .find(|adapter| adapter.provider_name() == provider_name)
            .ok_or_else(|| {
                ProviderError::Misconfigured(format!(
                    "no adapter registered for provider: {}",
                    provider_name
                ))
            })?;
        adapter.send_prompt(prompt).await
    }
}
