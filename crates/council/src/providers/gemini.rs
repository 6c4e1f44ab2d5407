use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::api_client::{ApiClient, AuthMethod};
use super::base::{ProviderAdapter, ProviderConfig};
use super::errors::ProviderError;
use crate::message::{Message, ProviderResponse, Role, TokenUsage};

pub const GEMINI_PROVIDER_NAME: &str = "Gemini";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const GEMINI_API_HOST: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug)]
pub struct GeminiAdapter {
    api_client: ApiClient,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiAdapter {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let host = config.host.as_deref().unwrap_or(GEMINI_API_HOST);
        let auth = AuthMethod::ApiKey {
            header_name: "x-goog-api-key".to_string(),
            key: config.api_key.clone(),
        };
        let api_client =
            ApiClient::new(host, auth)?.with_header("Content-Type", "application/json")?;

        Ok(Self {
            api_client,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
        })
    }

    fn generate_content_path(&self) -> String {
        format!("v1beta/models/{}:generateContent", self.model)
    }
}

/// Gemini has no system role; system turns become leading user turns.
fn create_request(messages: &[Message]) -> Result<Value, ProviderError> {
    let contents = messages
        .iter()
        .map(|message| GeminiContent {
            role: match message.role {
                Role::User | Role::System => "user".to_string(),
                Role::Assistant => "model".to_string(),
            },
            parts: vec![GeminiPart {
                text: message.content.clone(),
            }],
        })
        .collect();

    Ok(serde_json::to_value(GeminiRequest {
        contents,
        generation_config: GeminiGenerationConfig {
            max_output_tokens: 4096,
            temperature: 0.7,
        },
    })?)
}

fn parse_response(payload: &Value, model: &str) -> Result<ProviderResponse, ProviderError> {
    if let Ok(response) = serde_json::from_value::<GeminiResponse>(payload.clone()) {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text);
        if let Some(text) = text {
            let mut result =
                ProviderResponse::new(text, GEMINI_PROVIDER_NAME).with_model(model.to_string());
            if let Some(usage) = response.usage_metadata {
                result = result.with_usage(TokenUsage::new(
                    usage.prompt_token_count,
                    usage.candidates_token_count,
                    usage.total_token_count,
                ));
            }
            return Ok(result);
        }
        return Err(ProviderError::ApiRejected(
            "Gemini returned no candidates".to_string(),
        ));
    }

    if let Ok(error_response) = serde_json::from_value::<GeminiErrorResponse>(payload.clone()) {
        return Err(ProviderError::ApiRejected(format!(
            "Gemini API error: {}",
            error_response.error.message
        )));
    }

    Err(ProviderError::MalformedResponse(
        "response matched neither the Gemini success nor error schema".to_string(),
    ))
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider_name(&self) -> &str {
        GEMINI_PROVIDER_NAME
    }

    async fn send_messages(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let payload = create_request(messages)?;
        let response = self
            .api_client
            .api_post(&self.generate_content_path(), &payload)
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
    fn test_create_request_folds_system_into_user_turn() {
        let messages = [
            Message::system("you are terse"),
            Message::user("hello"),
            Message::assistant("hi"),
        ];
        let payload = create_request(&messages).unwrap();

        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "user");
        assert_eq!(contents[2]["role"], "model");
        assert_eq!(contents[0]["parts"][0]["text"], "you are terse");
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_parse_success_response() {
        let payload = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "So speaks Gemini."}]}
            }],
            "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 4, "totalTokenCount": 11}
        });

        let response = parse_response(&payload, GEMINI_DEFAULT_MODEL).unwrap();
        assert_eq!(response.content, "So speaks Gemini.");
        assert_eq!(response.model.as_deref(), Some(GEMINI_DEFAULT_MODEL));
        assert_eq!(response.usage.unwrap().total_tokens, Some(11));
    }

    #[test]
    fn test_parse_error_response() {
        let payload = json!({
            "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
        });

        let err = parse_response(&payload, GEMINI_DEFAULT_MODEL).unwrap_err();
        assert_eq!(err.kind(), "api_rejected");
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_parse_empty_candidates_rejected() {
        let payload = json!({"candidates": []});
        let err = parse_response(&payload, GEMINI_DEFAULT_MODEL).unwrap_err();
        assert_eq!(err.kind(), "api_rejected");
    }
}
