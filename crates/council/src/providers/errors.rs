use thiserror::Error;

/// Failure taxonomy shared by every provider adapter and the coordinator.
///
/// `Misconfigured` is the only variant that is fatal to a session: it is
/// raised at session start (no providers) or when an addressed provider is
/// missing. The per-call variants are absorbed at the advisor-turn level and
/// never abort a round.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider misconfigured: {0}")]
    Misconfigured(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("API rejected request: {0}")]
    ApiRejected(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("unsupported operation: {0}")]
    NotSupported(String),
}

impl ProviderError {
    /// Static tag for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Misconfigured(_) => "misconfigured",
            ProviderError::Transport(_) => "transport",
            ProviderError::ApiRejected(_) => "api_rejected",
            ProviderError::MalformedResponse(_) => "malformed_response",
            ProviderError::NotSupported(_) => "not_supported",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        let msg = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            match error.url().and_then(|u| u.host_str().map(str::to_string)) {
                Some(host) => format!("could not connect to {}", host),
                None => "could not connect to the provider".to_string(),
            }
        } else {
            error.to_string()
        };
        ProviderError::Transport(msg)
    }
}

// Request-body serialization failures count as transport-equivalent: the
// call never produced a usable exchange with the remote service.
impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Transport(format!("request serialization failed: {}", error))
    }
}
