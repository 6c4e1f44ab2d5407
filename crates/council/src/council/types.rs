use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One advisor utterance. Statements are immutable once recorded and are
/// appended in speaking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub advisor_name: String,
    pub statement: String,
    pub round: u32,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
}

impl Statement {
    pub fn new(
        advisor_name: impl Into<String>,
        statement: impl Into<String>,
        round: u32,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            advisor_name: advisor_name.into(),
            statement: statement.into(),
            round,
            timestamp: Utc::now(),
            provider: provider.into(),
        }
    }
}

/// Final snapshot of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilResult {
    pub session_id: String,
    pub query: String,
    pub statements: Vec<Statement>,
    pub transcript: String,
    pub summary: String,
    pub advisor_assignments: HashMap<String, String>,
}

/// Typed progress events emitted by a session, in order. Serialized
/// adjacently tagged so consumers dispatch on `type` and decode `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum CouncilEvent {
    #[serde(rename_all = "camelCase")]
    RoundStarted { round_number: u32, title: String },
    AdvisorResponse(Statement),
    #[serde(rename_all = "camelCase")]
    RoundCompleted {
        round_number: u32,
        statement_count: usize,
    },
    TranscriptGenerated { transcript: String },
    SummaryGenerated { summary: String },
    SessionCompleted(CouncilResult),
}

/// One statement flattened for web clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantResult {
    pub id: String,
    pub name: String,
    pub response: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Body of the synchronous query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilWebResponse {
    pub results: Vec<AssistantResult>,
    pub transcript: String,
    pub summary: String,
}

impl CouncilWebResponse {
    pub fn from_result(result: CouncilResult) -> Self {
        let results = result
            .statements
            .iter()
            .map(|statement| AssistantResult {
                id: statement.advisor_name.clone(),
                name: statement.advisor_name.clone(),
                response: statement.statement.clone(),
                timestamp: statement.timestamp.timestamp_millis(),
            })
            .collect();

        Self {
            results,
            transcript: result.transcript,
            summary: result.summary,
        }
    }
}
