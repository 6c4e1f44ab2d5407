use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::errors::ProviderError;

/// Default per-call timeout. Council turns are single-sentence completions,
/// so the bound is deliberately tighter than a general-purpose client would
/// use.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How a provider expects its credential on the wire.
pub enum AuthMethod {
    /// `Authorization: Bearer <token>`
    BearerToken(String),
    /// A provider-specific header, e.g. `x-api-key` or `x-goog-api-key`.
    ApiKey { header_name: String, key: String },
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::BearerToken(_) => f.debug_tuple("BearerToken").field(&"[hidden]").finish(),
            AuthMethod::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("header_name", header_name)
                .field("key", &"[hidden]")
                .finish(),
        }
    }
}

/// Status plus whatever JSON the remote returned. The payload is `None` when
/// the body was empty or not valid JSON; callers decide whether that is a
/// malformed response or an acceptable error body.
pub struct ApiResponse {
    pub status: StatusCode,
    pub payload: Option<Value>,
}

/// Thin shared HTTP layer used by every adapter: one host, one auth scheme,
/// optional default headers, JSON in and out.
pub struct ApiClient {
    client: Client,
    host: String,
    auth: AuthMethod,
    default_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(host: impl Into<String>, auth: AuthMethod) -> Result<Self, ProviderError> {
        Self::with_timeout(host, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        host: impl Into<String>,
        auth: AuthMethod,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Misconfigured(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            host: host.into(),
            auth,
            default_headers: HeaderMap::new(),
        })
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, ProviderError> {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ProviderError::Misconfigured(format!("header name {}: {}", key, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| ProviderError::Misconfigured(format!("header value for {}: {}", key, e)))?;
        self.default_headers.insert(name, header_value);
        Ok(self)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn build_url(&self, path: &str) -> Result<url::Url, ProviderError> {
        let mut base = url::Url::parse(&self.host)
            .map_err(|e| ProviderError::Misconfigured(format!("invalid base URL: {}", e)))?;

        let base_path = base.path();
        if !base_path.is_empty() && base_path != "/" && !base_path.ends_with('/') {
            base.set_path(&format!("{}/", base_path));
        }

        base.join(path)
            .map_err(|e| ProviderError::Misconfigured(format!("failed to construct URL: {}", e)))
    }

    /// POST a JSON payload and read the response back as JSON without
    /// interpreting the status code.
    pub async fn api_post(&self, path: &str, payload: &Value) -> Result<ApiResponse, ProviderError> {
        let url = self.build_url(path)?;
        tracing::debug!(url = %url, "provider request");

        let mut request = self
            .client
            .post(url)
            .headers(self.default_headers.clone())
            .json(payload);

        request = match &self.auth {
            AuthMethod::BearerToken(token) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
            AuthMethod::ApiKey { header_name, key } => request.header(header_name.as_str(), key),
        };

        let response = request.send().await?;
        let status = response.status();
        let payload = response.json().await.ok();
        Ok(ApiResponse { status, payload })
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("host", &self.host)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
