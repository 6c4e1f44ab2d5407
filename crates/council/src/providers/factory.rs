use std::sync::Arc;

use super::anthropic::AnthropicAdapter;
use super::base::{ProviderAdapter, ProviderConfig};
use super::errors::ProviderError;
use super::gemini::GeminiAdapter;
use super::mistral::MistralAdapter;
use super::openai::OpenAiAdapter;
use super::perplexity::PerplexityAdapter;

/// Build the adapter named by a provider config record.
pub fn create(config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiAdapter::from_config(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicAdapter::from_config(config)?)),
        "gemini" => Ok(Arc::new(GeminiAdapter::from_config(config)?)),
        "mistral" => Ok(Arc::new(MistralAdapter::from_config(config)?)),
        "perplexity" => Ok(Arc::new(PerplexityAdapter::from_config(config)?)),
        other => Err(ProviderError::Misconfigured(format!(
            "unknown provider: {}",
            other
        ))),
    }
}
