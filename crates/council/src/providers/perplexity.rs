use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::api_client::{ApiClient, AuthMethod};
use super::base::{ProviderAdapter, ProviderConfig};
use super::errors::ProviderError;
use crate::message::{Message, ProviderResponse, Role, TokenUsage};

pub const PERPLEXITY_PROVIDER_NAME: &str = "Perplexity";
pub const PERPLEXITY_DEFAULT_MODEL: &str = "llama-3.1-sonar-large-128k-online";
pub const PERPLEXITY_API_HOST: &str = "https://api.perplexity.ai";

const PERPLEXITY_COMPLETIONS_PATH: &str = "chat/completions";

#[derive(Debug)]
pub struct PerplexityAdapter {
    api_client: ApiClient,
    model: String,
}

#[derive(Debug, Serialize)]
struct PerplexityRequest {
    model: String,
    messages: Vec<PerplexityMessage>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    return_images: bool,
    return_related_questions: bool,
    search_recency_filter: String,
    stream: bool,
    presence_penalty: f64,
    frequency_penalty: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PerplexityMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct PerplexityResponse {
    model: Option<String>,
    choices: Vec<PerplexityChoice>,
    usage: Option<PerplexityUsage>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    message: PerplexityMessage,
}

#[derive(Debug, Deserialize)]
struct PerplexityUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PerplexityErrorResponse {
    error: PerplexityError,
}

#[derive(Debug, Deserialize)]
struct PerplexityError {
    message: String,
}

impl PerplexityAdapter {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let host = config.host.as_deref().unwrap_or(PERPLEXITY_API_HOST);
        let auth = AuthMethod::BearerToken(config.api_key.clone());
        let api_client = ApiClient::new(host, auth)?;

        Ok(Self {
            api_client,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| PERPLEXITY_DEFAULT_MODEL.to_string()),
        })
    }
}

fn create_request(model: &str, messages: &[Message]) -> Result<Value, ProviderError> {
    let perplexity_messages = messages
        .iter()
        .map(|message| PerplexityMessage {
            role: match message.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: message.content.clone(),
        })
        .collect();

    Ok(serde_json::to_value(PerplexityRequest {
        model: model.to_string(),
        messages: perplexity_messages,
        max_tokens: 4096,
        temperature: 0.7,
        top_p: 0.9,
        return_images: false,
        return_related_questions: false,
        search_recency_filter: "month".to_string(),
        stream: false,
        presence_penalty: 0.0,
        frequency_penalty: 1.0,
    })?)
}

fn parse_response(payload: &Value, model: &str) -> Result<ProviderResponse, ProviderError> {
    if let Ok(response) = serde_json::from_value::<PerplexityResponse>(payload.clone()) {
        if let Some(choice) = response.choices.into_iter().next() {
            let mut result =
                ProviderResponse::new(choice.message.content, PERPLEXITY_PROVIDER_NAME)
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
            "Perplexity returned no choices".to_string(),
        ));
    }

    if let Ok(error_response) = serde_json::from_value::<PerplexityErrorResponse>(payload.clone()) {
        return Err(ProviderError::ApiRejected(format!(
            "Perplexity API error: {}",
            error_response.error.message
        )));
    }

    Err(ProviderError::MalformedResponse(
        "response matched neither the Perplexity success nor error schema".to_string(),
    ))
}

#[async_trait]
impl ProviderAdapter for PerplexityAdapter {
    fn provider_name(&self) -> &str {
        PERPLEXITY_PROVIDER_NAME
    }

    async fn send_messages(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let payload = create_request(&self.model, messages)?;
        let response = self
            .api_client
            .api_post(PERPLEXITY_COMPLETIONS_PATH, &payload)
            .await?;
        let body = response.payload.ok_or_else(|| {
            ProviderError::MalformedResponse(format!(
                "response body is not valid JSON (status {})",
                response.status
            ))
        })?;
        parse_response(&body, &self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_includes_search_options() {
        let payload = create_request(PERPLEXITY_DEFAULT_MODEL, &[Message::user("hi")]).unwrap();
        assert_eq!(payload["search_recency_filter"], "month");
        assert_eq!(payload["return_images"], false);
        assert_eq!(payload["frequency_penalty"], 1.0);
    }

    #[test]
    fn test_parse_success_response() {
        let payload = json!({
            "id": "ppx-test",
            "model": "llama-3.1-sonar-large-128k-online",
            "choices": [{
                "index": 0,
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Sources agree."}
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 2, "total_tokens": 22}
        });

        let response = parse_response(&payload, PERPLEXITY_DEFAULT_MODEL).unwrap();
        assert_eq!(response.content, "Sources agree.");
        assert_eq!(response.provider, PERPLEXITY_PROVIDER_NAME);
    }

    #[test]
    fn test_parse_error_response() {
        let payload = json!({"error": {"message": "invalid model", "type": "bad_request"}});
        let err = parse_response(&payload, PERPLEXITY_DEFAULT_MODEL).unwrap_err();
        assert_eq!(err.kind(), "api_rejected");
    }
}
