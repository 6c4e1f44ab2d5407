use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::api_client::{ApiClient, AuthMethod};
use super::base::{ProviderAdapter, ProviderConfig};
use super::errors::ProviderError;
use crate::message::{Message, ProviderResponse, Role, TokenUsage};

pub const ANTHROPIC_PROVIDER_NAME: &str = "Anthropic";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const ANTHROPIC_API_HOST: &str = "https://api.anthropic.com";

const ANTHROPIC_MESSAGES_PATH: &str = "v1/messages";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicAdapter {
    api_client: ApiClient,
    model: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: Option<String>,
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    message: String,
}

impl AnthropicAdapter {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let host = config.host.as_deref().unwrap_or(ANTHROPIC_API_HOST);
        let auth = AuthMethod::ApiKey {
            header_name: "x-api-key".to_string(),
            key: config.api_key.clone(),
        };
        let api_client =
            ApiClient::new(host, auth)?.with_header("anthropic-version", ANTHROPIC_API_VERSION)?;

        Ok(Self {
            api_client,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| ANTHROPIC_DEFAULT_MODEL.to_string()),
        })
    }
}

/// The messages API has no system role: system turns are lifted out of the
/// conversation into the top-level `system` field.
fn create_request(model: &str, messages: &[Message]) -> Result<Value, ProviderError> {
    let anthropic_messages = messages
        .iter()
        .filter_map(|message| match message.role {
            Role::User => Some(AnthropicMessage {
                role: "user".to_string(),
                content: message.content.clone(),
            }),
            Role::Assistant => Some(AnthropicMessage {
                role: "assistant".to_string(),
                content: message.content.clone(),
            }),
            Role::System => None,
        })
        .collect();

    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.clone());

    Ok(serde_json::to_value(AnthropicRequest {
        model: model.to_string(),
        max_tokens: 4096,
        messages: anthropic_messages,
        system,
    })?)
}

fn parse_response(payload: &Value, model: &str) -> Result<ProviderResponse, ProviderError> {
    if let Ok(response) = serde_json::from_value::<AnthropicResponse>(payload.clone()) {
        if let Some(content) = response.content.into_iter().next() {
            let mut result = ProviderResponse::new(content.text, ANTHROPIC_PROVIDER_NAME)
                .with_model(response.model.unwrap_or_else(|| model.to_string()));
            if let Some(usage) = response.usage {
                let total = match (usage.input_tokens, usage.output_tokens) {
                    (Some(input), Some(output)) => Some(input + output),
                    _ => None,
                };
                result = result.with_usage(TokenUsage::new(
                    usage.input_tokens,
                    usage.output_tokens,
                    total,
                ));
            }
            return Ok(result);
        }
        return Err(ProviderError::ApiRejected(
            "Anthropic returned no content blocks".to_string(),
        ));
    }

    if let Ok(error_response) = serde_json::from_value::<AnthropicErrorResponse>(payload.clone()) {
        return Err(ProviderError::ApiRejected(format!(
            "Anthropic API error: {}",
            error_response.error.message
        )));
    }

    Err(ProviderError::MalformedResponse(
        "response matched neither the Anthropic success nor error schema".to_string(),
    ))
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider_name(&self) -> &str {
        ANTHROPIC_PROVIDER_NAME
    }

    async fn send_messages(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let payload = create_request(&self.model, messages)?;
        let response = self.api_client.api_post(ANTHROPIC_MESSAGES_PATH, &payload).await?;
        let body = response.payload.ok_or_else(|| {
            ProviderError::MalformedResponse(format!(
                "response body is not valid JSON (status {})",
                response.status
            ))
        })?;
        parse_response(&body, &self.model)
    }
}
