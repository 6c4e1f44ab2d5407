use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{error, info};
use utoipa::ToSchema;

use council::council::types::{CouncilEvent, CouncilWebResponse};
use council::providers::errors::ProviderError;

use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StreamQuery {
    /// The matter to put before the council.
    query: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CouncilQueryRequest {
    query: String,
}

/// Server-sent event response. Dropping it (client disconnect) cancels the
/// session driver through the held token guard.
pub struct SseResponse {
    rx: ReceiverStream<String>,
    _guard: DropGuard,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>, guard: DropGuard) -> Self {
        Self { rx, _guard: guard }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Connection", "keep-alive")
            .body(body)
            .unwrap()
    }
}

/// Frame one event for the wire. A serialization failure becomes an error
/// record rather than a torn frame.
fn encode_frame(event: &CouncilEvent) -> String {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(err) => {
            error!("failed to encode council event: {}", err);
            serde_json::json!({
                "type": "error",
                "data": { "error": format!("failed to encode event: {err}") }
            })
            .to_string()
        }
    };
    format!("data: {payload}\n\n")
}

fn error_frame(error: &ProviderError) -> String {
    let payload = serde_json::json!({
        "type": "error",
        "data": { "error": error.to_string() }
    });
    format!("data: {payload}\n\n")
}

fn status_for(error: &ProviderError) -> StatusCode {
    match error {
        ProviderError::Misconfigured(_) => StatusCode::PRECONDITION_FAILED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[utoipa::path(
    get,
    path = "/stream/council",
    params(
        ("query" = String, Query, description = "The matter to put before the council")
    ),
    responses(
        (status = 200, description = "Council session event stream", content_type = "text/event-stream"),
        (status = 412, description = "No providers configured"),
    ),
    tag = "council"
)]
async fn stream_council(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamQuery>,
) -> Result<SseResponse, StatusCode> {
    let orchestrator = state.build_orchestrator();
    let mut session = orchestrator
        .start_session(&params.query)
        .map_err(|e| status_for(&e))?;

    info!(session_id = %session.session_id, "streaming council session");

    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);
    let cancel_token = CancellationToken::new();
    let driver_token = cancel_token.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = driver_token.cancelled() => break,
                event = session.next_event() => match event {
                    Ok(Some(event)) => {
                        if tx.send(encode_frame(&event)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        error!(session_id = %session.session_id, "council session failed: {}", err);
                        let _ = tx.send(error_frame(&err)).await;
                        break;
                    }
                },
            }
        }
    });

    Ok(SseResponse::new(stream, cancel_token.drop_guard()))
}

#[utoipa::path(
    post,
    path = "/api/query",
    request_body = CouncilQueryRequest,
    responses(
        (status = 200, description = "Completed council session"),
        (status = 412, description = "No providers configured"),
        (status = 500, description = "Council session failed"),
    ),
    tag = "council"
)]
async fn query_council(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CouncilQueryRequest>,
) -> Result<Json<CouncilWebResponse>, StatusCode> {
    let orchestrator = state.build_orchestrator();
    let result = orchestrator
        .conduct_session(&request.query)
        .await
        .map_err(|err| {
            error!("council session failed: {}", err);
            status_for(&err)
        })?;

    Ok(Json(CouncilWebResponse::from_result(result)))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stream/council", get(stream_council))
        .route("/api/query", post(query_council))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use council::providers::base::ProviderConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_openai() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o",
                "choices": [
                    { "message": { "role": "assistant", "content": "Counsel given." } }
                ],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            })))
            .mount(&server)
            .await;
        server
    }

    fn app_with_mock(server: &MockServer) -> Router {
        let state = AppState::new(vec![
            ProviderConfig::new("openai", "test-key").with_host(server.uri())
        ]);
        routes(state)
    }

    #[tokio::test]
    async fn test_query_endpoint_runs_full_session() {
        let server = mock_openai().await;
        let app = app_with_mock(&server);

        let request = Request::builder()
            .method("POST")
            .uri("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query": "Should I buy a boat?"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();

        let results = value["results"].as_array().unwrap();
        assert!(results.len() >= 24, "expected at least 8 speakers per round");
        for result in results {
            assert_eq!(result["response"], "Counsel given.");
            assert!(result["timestamp"].as_i64().unwrap() > 0);
        }
        assert!(value["transcript"]
            .as_str()
            .unwrap()
            .contains("COUNCIL SESSION TRANSCRIPT"));
        assert_eq!(value["summary"], "Counsel given.");
    }

    #[tokio::test]
    async fn test_stream_endpoint_emits_ordered_event_frames() {
        let server = mock_openai().await;
        let app = app_with_mock(&server);

        let request = Request::builder()
            .uri("/stream/council?query=hello")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        let events: Vec<Value> = text
            .split("\n\n")
            .filter(|frame| !frame.is_empty())
            .map(|frame| {
                let payload = frame.strip_prefix("data: ").expect("frame prefix");
                serde_json::from_str(payload).expect("frame json")
            })
            .collect();

        assert_eq!(events.first().unwrap()["type"], "roundStarted");
        assert_eq!(events.first().unwrap()["data"]["title"], "Initial Positions");
        assert_eq!(events.last().unwrap()["type"], "sessionCompleted");

        let count_of = |kind: &str| events.iter().filter(|e| e["type"] == kind).count();
        assert_eq!(count_of("roundStarted"), 3);
        assert_eq!(count_of("roundCompleted"), 3);
        assert_eq!(count_of("transcriptGenerated"), 1);
        assert_eq!(count_of("summaryGenerated"), 1);
        assert_eq!(count_of("sessionCompleted"), 1);

        let spoken = count_of("advisorResponse");
        assert!((24..=30).contains(&spoken), "got {spoken} advisor responses");
    }

    #[tokio::test]
    async fn test_stream_without_providers_is_precondition_failed() {
        let app = routes(AppState::new(vec![]));

        let request = Request::builder()
            .uri("/stream/council?query=hello")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_fallback_statements_and_error_frame() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "message": "quota exceeded" }
            })))
            .mount(&server)
            .await;
        let app = app_with_mock(&server);

        let request = Request::builder()
            .uri("/stream/council?query=hello")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let events: Vec<Value> = text
            .split("\n\n")
            .filter(|frame| !frame.is_empty())
            .map(|frame| serde_json::from_str(frame.strip_prefix("data: ").unwrap()).unwrap())
            .collect();

        // Advisor turns absorb the failure as fallback statements; the
        // summary call then fails the session with an error frame.
        assert!(events.iter().any(|e| e["type"] == "advisorResponse"
            && e["data"]["statement"] == "I find myself at a loss for words on this matter."));
        assert_eq!(events.last().unwrap()["type"], "error");
        assert!(!events.iter().any(|e| e["type"] == "sessionCompleted"));
    }
}
