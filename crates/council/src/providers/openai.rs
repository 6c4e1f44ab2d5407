use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::api_client::{ApiClient, AuthMethod};
use super::base::{ProviderAdapter, ProviderConfig};
use super::errors::ProviderError;
use crate::message::{Message, ProviderResponse, Role, TokenUsage};

pub const OPENAI_PROVIDER_NAME: &str = "OpenAI";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
pub const OPENAI_API_HOST: &str = "https://api.openai.com";

const OPENAI_COMPLETIONS_PATH: &str = "v1/chat/completions";

#[derive(Debug)]
pub struct OpenAiAdapter {
    api_client: ApiClient,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: Option<String>,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

impl OpenAiAdapter {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let host = config.host.as_deref().unwrap_or(OPENAI_API_HOST);
        let auth = AuthMethod::BearerToken(config.api_key.clone());
        let api_client = ApiClient::new(host, auth)?;

        Ok(Self {
            api_client,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
        })
    }
}

fn create_request(model: &str, messages: &[Message]) -> Result<Value, ProviderError> {
    let openai_messages = messages
        .iter()
        .map(|message| OpenAiMessage {
            role: match message.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: message.content.clone(),
        })
        .collect();

    Ok(serde_json::to_value(OpenAiRequest {
        model: model.to_string(),
        messages: openai_messages,
        max_tokens: 4096,
        temperature: 0.7,
    })?)
}

fn parse_response(payload: &Value, model: &str) -> Result<ProviderResponse, ProviderError> {
    if let Ok(response) = serde_json::from_value::<OpenAiResponse>(payload.clone()) {
        if let Some(choice) = response.choices.into_iter().next() {
            let mut result = ProviderResponse::new(choice.message.content, OPENAI_PROVIDER_NAME)
                .with_model(response.model.unwrap_or_else(|| model.to_string()));
            if let Some(usage) = response.usage {
                result = result.with_usage(TokenUsage::new(
                    usage.prompt_tokens,
                    usage.completion_tokens,
                    usage.total_tokens,
                ));
            }
            return Ok(result);
        }
        return Err(ProviderError::ApiRejected(
            "OpenAI returned no choices".to_string(),
        ));
    }

    if let Ok(error_response) = serde_json::from_value::<OpenAiErrorResponse>(payload.clone()) {
        return Err(ProviderError::ApiRejected(format!(
            "OpenAI API error: {}",
            error_response.error.message
        )));
    }

    Err(ProviderError::MalformedResponse(
        "response matched neither the OpenAI success nor error schema".to_string(),
    ))
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider_name(&self) -> &str {
        OPENAI_PROVIDER_NAME
    }

    async fn send_messages(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let payload = create_request(&self.model, messages)?;
        let response = self.api_client.api_post(OPENAI_COMPLETIONS_PATH, &payload).await?;
        let body = response.payload.ok_or_else(|| {
            ProviderError::MalformedResponse(format!(
                "response body is not valid JSON (status {})",
                response.status
            ))
        })?;
        parse_response(&body, &self.model)
    }
}
