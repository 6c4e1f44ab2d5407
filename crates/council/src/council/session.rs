use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use super::advisors::{round_title, Advisor};
use super::orchestrator::CouncilOrchestrator;
use super::types::{CouncilEvent, CouncilResult, Statement};
use crate::providers::errors::ProviderError;

/// Fallback text when an assigned provider fails mid-turn.
const LOSS_FOR_WORDS: &str = "I find myself at a loss for words on this matter.";
/// Fallback text when an advisor somehow has no provider assignment.
const REMAIN_SILENT: &str = "I must remain silent on this matter.";

#[derive(Debug, Clone, Copy)]
enum SessionState {
    Initial,
    RoundStarted(u32),
    AdvisorSpeaking(u32),
    RoundCompleted(u32),
    GeneratingTranscript,
    GeneratingSummary,
    Completed,
}

/// One in-flight deliberation. Events are pulled one at a time with
/// `next_event`; remote calls only happen while a call is outstanding, so
/// dropping the session cancels whatever was in flight.
pub struct CouncilSession {
    pub session_id: String,
    pub query: String,
    pub advisor_assignments: HashMap<String, String>,
    orchestrator: Arc<CouncilOrchestrator>,
    rng: StdRng,
    state: SessionState,
    statements: Vec<Statement>,
    round_advisors: Vec<Advisor>,
    advisor_index: usize,
    transcript: Option<String>,
    summary: Option<String>,
}

impl CouncilSession {
    pub(crate) fn new(
        query: &str,
        advisor_assignments: HashMap<String, String>,
        orchestrator: Arc<CouncilOrchestrator>,
        rng: StdRng,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            query: query.to_string(),
            advisor_assignments,
            orchestrator,
            rng,
            state: SessionState::Initial,
            statements: Vec::new(),
            round_advisors: Vec::new(),
            advisor_index: 0,
            transcript: None,
            summary: None,
        }
    }

    /// Advance the session by exactly one event. Returns `Ok(None)` once the
    /// session has completed; calling again after that stays `Ok(None)`.
    /// Only a summary-generation failure is fatal; advisor-turn failures are
    /// absorbed into fallback statements.
    pub async fn next_event(&mut self) -> Result<Option<CouncilEvent>, ProviderError> {
        match self.state {
            SessionState::Initial => {
                self.state = SessionState::RoundStarted(1);
                Ok(Some(CouncilEvent::RoundStarted {
                    round_number: 1,
                    title: round_title(1).to_string(),
                }))
            }

            SessionState::RoundStarted(round) => {
                let participants = self.rng.gen_range(8..=10);
                let mut pool = self.orchestrator.advisors().to_vec();
                pool.shuffle(&mut self.rng);
                pool.truncate(participants);

                debug!(
                    session_id = %self.session_id,
                    round,
                    participants = pool.len(),
                    "round participants drawn"
                );

                self.round_advisors = pool;
                self.advisor_index = 0;
                self.state = SessionState::AdvisorSpeaking(round);
                Ok(Some(self.next_advisor_response(round).await))
            }

            SessionState::AdvisorSpeaking(round) => {
                self.advisor_index += 1;
                if self.advisor_index < self.round_advisors.len() {
                    Ok(Some(self.next_advisor_response(round).await))
                } else {
                    self.state = SessionState::RoundCompleted(round);
                    Ok(Some(CouncilEvent::RoundCompleted {
                        round_number: round,
                        statement_count: self.round_advisors.len(),
                    }))
                }
            }

            SessionState::RoundCompleted(round) => {
                if round < 3 {
                    let next = round + 1;
                    self.state = SessionState::RoundStarted(next);
                    Ok(Some(CouncilEvent::RoundStarted {
                        round_number: next,
                        title: round_title(next).to_string(),
                    }))
                } else {
                    let transcript = self
                        .orchestrator
                        .generate_transcript(&self.statements, &self.query);
                    self.transcript = Some(transcript.clone());
                    self.state = SessionState::GeneratingTranscript;
                    Ok(Some(CouncilEvent::TranscriptGenerated { transcript }))
                }
            }

            SessionState::GeneratingTranscript => {
                let summary = self
                    .orchestrator
                    .generate_summary(&self.statements, &self.query)
                    .await?;
                self.summary = Some(summary.clone());
                self.state = SessionState::GeneratingSummary;
                Ok(Some(CouncilEvent::SummaryGenerated { summary }))
            }

            SessionState::GeneratingSummary => {
                let transcript = match self.transcript.clone() {
                    Some(transcript) => transcript,
                    None => self
                        .orchestrator
                        .generate_transcript(&self.statements, &self.query),
                };
                let result = CouncilResult {
                    session_id: self.session_id.clone(),
                    query: self.query.clone(),
                    statements: self.statements.clone(),
                    transcript,
                    summary: self.summary.clone().unwrap_or_default(),
                    advisor_assignments: self.advisor_assignments.clone(),
                };
                self.state = SessionState::Completed;
                Ok(Some(CouncilEvent::SessionCompleted(result)))
            }

            SessionState::Completed => Ok(None),
        }
    }

    async fn next_advisor_response(&mut self, round: u32) -> CouncilEvent {
        let advisor = self.round_advisors[self.advisor_index].clone();

        let Some(provider) = self.advisor_assignments.get(&advisor.name).cloned() else {
            warn!(advisor = %advisor.name, "advisor has no provider assignment");
            let statement = Statement::new(advisor.name, REMAIN_SILENT, round, "unknown");
            self.statements.push(statement.clone());
            return CouncilEvent::AdvisorResponse(statement);
        };

        let current_round: Vec<Statement> = self
            .statements
            .iter()
            .filter(|s| s.round == round)
            .cloned()
            .collect();
        let prompt = self.orchestrator.build_contextual_prompt(
            &advisor,
            &self.query,
            &current_round,
            round,
        );

        let statement = match self
            .orchestrator
            .coordinator()
            .query_specific(&provider, &prompt)
            .await
        {
            Ok(response) => Statement::new(&advisor.name, response.content, round, &provider),
            Err(error) => {
                warn!(
                    session_id = %self.session_id,
                    advisor = %advisor.name,
                    provider = %provider,
                    kind = error.kind(),
                    "advisor turn failed: {}",
                    error
                );
                Statement::new(&advisor.name, LOSS_FOR_WORDS, round, &provider)
            }
        };

        self.statements.push(statement.clone());
        CouncilEvent::AdvisorResponse(statement)
    }
}
