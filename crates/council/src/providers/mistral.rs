use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::api_client::{ApiClient, AuthMethod};
use super::base::{ProviderAdapter, ProviderConfig};
use super::errors::ProviderError;
use crate::message::{Message, ProviderResponse, Role, TokenUsage};

pub const MISTRAL_PROVIDER_NAME: &str = "Mistral";
pub const MISTRAL_DEFAULT_MODEL: &str = "mistral-large-latest";
pub const MISTRAL_API_HOST: &str = "https://api.mistral.ai";

const MISTRAL_COMPLETIONS_PATH: &str = "v1/chat/completions";

#[derive(Debug)]
pub struct MistralAdapter {
    api_client: ApiClient,
    model: String,
}

#[derive(Debug, Serialize)]
struct MistralRequest {
    model: String,
    messages: Vec<MistralMessage>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct MistralMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MistralResponse {
    model: Option<String>,
    choices: Vec<MistralChoice>,
    usage: Option<MistralUsage>,
}

#[derive(Debug, Deserialize)]
struct MistralChoice {
    message: MistralMessage,
}

#[derive(Debug, Deserialize)]
struct MistralUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MistralErrorResponse {
    error: MistralError,
}

#[derive(Debug, Deserialize)]
struct MistralError {
    message: String,
}

impl MistralAdapter {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let host = config.host.as_deref().unwrap_or(MISTRAL_API_HOST);
        let auth = AuthMethod::BearerToken(config.api_key.clone());
        let api_client = ApiClient::new(host, auth)?;

        Ok(Self {
            api_client,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| MISTRAL_DEFAULT_MODEL.to_string()),
        })
    }
}

fn create_request(model: &str, messages: &[Message]) -> Result<Value, ProviderError> {
    let mistral_messages = messages
        .iter()
        .map(|message| MistralMessage {
            role: match message.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: message.content.clone(),
        })
        .collect();

    Ok(serde_json::to_value(MistralRequest {
        model: model.to_string(),
        messages: mistral_messages,
        max_tokens: 4096,
        temperature: 0.7,
        stream: false,
    })?)
}

fn parse_response(payload: &Value, model: &str) -> Result<ProviderResponse, ProviderError> {
    if let Ok(response) = serde_json::from_value::<MistralResponse>(payload.clone()) {
        if let Some(choice) = response.choices.into_iter().next() {
            let mut result = ProviderResponse::new(choice.message.content, MISTRAL_PROVIDER_NAME)
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
            "Mistral returned no choices".to_string(),
        ));
    }

    if let Ok(error_response) = serde_json::from_value::<MistralErrorResponse>(payload.clone()) {
        return Err(ProviderError::ApiRejected(format!(
            "Mistral API error: {}",
            error_response.error.message
        )));
    }

    Err(ProviderError::MalformedResponse(
        "response matched neither the Mistral success nor error schema".to_string(),
    ))
}

#[async_trait]
impl ProviderAdapter for MistralAdapter {
    fn provider_name(&self) -> &str {
        MISTRAL_PROVIDER_NAME
    }

    async fn send_messages(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let payload = create_request(&self.model, messages)?;
        let response = self
            .api_client
            .api_post(MISTRAL_COMPLETIONS_PATH, &payload)
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
    fn test_create_request_sets_stream_false() {
        let payload = create_request(MISTRAL_DEFAULT_MODEL, &[Message::user("hi")]).unwrap();
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["model"], MISTRAL_DEFAULT_MODEL);
    }

    #[test]
    fn test_parse_success_response() {
        let payload = json!({
            "id": "cmpl-test",
            "model": "mistral-large-latest",
            "choices": [{
                "index": 0,
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Bonjour, council."}
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
        });

        let response = parse_response(&payload, MISTRAL_DEFAULT_MODEL).unwrap();
        assert_eq!(response.content, "Bonjour, council.");
        assert_eq!(response.usage.unwrap().total_tokens, Some(12));
    }

    #[test]
    fn test_parse_error_response() {
        let payload = json!({"error": {"message": "Unauthorized", "type": "invalid_api_key"}});
        let err = parse_response(&payload, MISTRAL_DEFAULT_MODEL).unwrap_err();
        assert_eq!(err.kind(), "api_rejected");
    }

    #[test]
    fn test_parse_unrecognized_body_is_malformed() {
        let err = parse_response(&json!("plain string"), MISTRAL_DEFAULT_MODEL).unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }
}
