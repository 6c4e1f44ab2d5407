//! Scriptable stub adapter for coordinator and orchestrator tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::base::ProviderAdapter;
use super::errors::ProviderError;
use crate::message::{Message, ProviderResponse};

pub struct MockAdapter {
    name: String,
    reply: Result<String, ProviderError>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    completed: Arc<AtomicBool>,
}

impl MockAdapter {
    pub fn succeeding(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: Ok(reply.into()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            reply: Err(error),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Flag set only when a call runs to completion; an aborted call never
    /// sets it, which is how race-loser cancellation is observed.
    pub fn completion_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.completed)
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn send_messages(&self, _messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.store(true, Ordering::SeqCst);
        match &self.reply {
            Ok(content) => Ok(ProviderResponse::new(content.clone(), self.name.clone())),
            Err(error) => Err(error.clone()),
        }
    }
}
