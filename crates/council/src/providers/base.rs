use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::ProviderError;
use crate::message::{Message, ProviderResponse};

/// One remote text-generation service, normalized to the common message
/// contract. Implementations hold only static configuration (credentials,
/// model, endpoint) and must tolerate concurrent calls: `query_all` and
/// `query_race` invoke the same adapter from multiple tasks at once.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Registry name, e.g. "OpenAI". Also the name the orchestrator stripes
    /// advisors across.
    fn provider_name(&self) -> &str;

    /// Send an ordered message list and return the normalized completion.
    async fn send_messages(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError>;

    /// Convenience wrapper for the single-user-turn case, which is how the
    /// orchestrator issues every advisor prompt.
    async fn send_prompt(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        self.send_messages(&[Message::user(prompt)]).await
    }
}

/// Static configuration for one provider, one record per configured
/// provider in the secrets file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Factory key: "openai", "anthropic", "gemini", "perplexity", "mistral".
    pub provider: String,
    pub api_key: String,
    /// Model override; each adapter has its own default.
    #[serde(default)]
    pub model: Option<String>,
    /// Host override, used to point adapters at a different endpoint.
    #[serde(default)]
    pub host: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            model: None,
            host: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserializes_secrets_record() {
        let json = r#"{"provider": "anthropic", "apiKey": "sk-test", "model": "claude-3-5-sonnet-20241022"}"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model.as_deref(), Some("claude-3-5-sonnet-20241022"));
        assert!(config.host.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ProviderConfig::new("openai", "key")
            .with_model("gpt-4o-mini")
            .with_host("http://localhost:9000");
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.host.as_deref(), Some("http://localhost:9000"));
    }
}
