use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::advisors::{self, round_title, Advisor};
use super::session::CouncilSession;
use super::types::{CouncilEvent, CouncilResult, Statement};
use crate::coordinator::Coordinator;
use crate::providers::errors::ProviderError;

/// Owns the advisor roster and the provider coordinator, and hands out
/// sessions. The roster is fixed at construction; hidden agendas are rolled
/// once per orchestrator, not per session.
pub struct CouncilOrchestrator {
    coordinator: Coordinator,
    advisors: Vec<Advisor>,
    rng: Mutex<StdRng>,
}

impl CouncilOrchestrator {
    pub fn new(coordinator: Coordinator) -> Self {
        Self::with_rng(coordinator, StdRng::from_entropy())
    }

    /// Construct with an injected RNG so tests can pin the roster, the
    /// advisor assignment, and the per-round sampling.
    pub fn with_rng(coordinator: Coordinator, mut rng: StdRng) -> Self {
        let advisors = advisors::build_roster(&mut rng);
        Self {
            coordinator,
            advisors,
            rng: Mutex::new(rng),
        }
    }

    pub fn advisors(&self) -> &[Advisor] {
        &self.advisors
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Begin a session: assign every advisor a provider round-robin over a
    /// freshly shuffled roster. Assignments live for this session only.
    pub fn start_session(self: &Arc<Self>, query: &str) -> Result<CouncilSession, ProviderError> {
        let providers = self.coordinator.list_providers();
        if providers.is_empty() {
            return Err(ProviderError::Misconfigured(
                "no providers available for council session".to_string(),
            ));
        }

        let (assignments, session_rng) = {
            let mut rng = self.rng();
            let mut shuffled = self.advisors.clone();
            shuffled.shuffle(&mut *rng);

            let mut assignments = HashMap::new();
            for (index, advisor) in shuffled.iter().enumerate() {
                assignments.insert(
                    advisor.name.clone(),
                    providers[index % providers.len()].clone(),
                );
            }

            (assignments, StdRng::seed_from_u64(rng.gen()))
        };

        let session = CouncilSession::new(query, assignments, Arc::clone(self), session_rng);
        info!(
            session_id = %session.session_id,
            advisors = self.advisors.len(),
            providers = providers.len(),
            "starting council session"
        );
        Ok(session)
    }

    /// Drive a session to completion and return its final result. Used by
    /// the synchronous endpoint.
    pub async fn conduct_session(self: &Arc<Self>, query: &str) -> Result<CouncilResult, ProviderError> {
        let mut session = self.start_session(query)?;
        while let Some(event) = session.next_event().await? {
            if let CouncilEvent::SessionCompleted(result) = event {
                info!(
                    session_id = %result.session_id,
                    statements = result.statements.len(),
                    "council session completed"
                );
                return Ok(result);
            }
        }
        Err(ProviderError::Transport(
            "council session ended without a completion event".to_string(),
        ))
    }

    fn advisor_lookup(&self, name: &str) -> Option<&Advisor> {
        self.advisors.iter().find(|advisor| advisor.name == name)
    }

    /// Assemble the full prompt for one advisor turn: persona, original
    /// query, what has already been said in the current round, and the
    /// round's instruction.
    pub fn build_contextual_prompt(
        &self,
        advisor: &Advisor,
        original_query: &str,
        previous_statements: &[Statement],
        round_number: u32,
    ) -> String {
        let mut prompt = format!(
            "{}\n\nORIGINAL QUESTION: {}\n\n",
            advisor.system_prompt, original_query
        );

        if round_number > 1 && !previous_statements.is_empty() {
            prompt.push_str("PREVIOUS ADVISOR STATEMENTS IN THIS ROUND:\n");
            for statement in previous_statements {
                let title = self
                    .advisor_lookup(&statement.advisor_name)
                    .map(|a| a.title.as_str())
                    .unwrap_or("Unknown");
                prompt.push_str(&format!(
                    "- {} {}: {}\n",
                    statement.advisor_name, title, statement.statement
                ));
            }
            prompt.push('\n');
        }

        prompt.push_str(match round_number {
            1 => "This is the first round. Give your initial counsel on this matter. What is your perspective?",
            2 => "This is the debate round. React to what others have said and defend or modify your position. You may agree, disagree, or build upon previous statements.",
            3 => "This is the final round. Help the council reach a consensus or final recommendation. What is your concluding advice?",
            _ => "Please provide your counsel on this matter.",
        });

        prompt
    }

    /// Deterministic rendering of the session so far. Pure with respect to
    /// its inputs; same statements and query always yield the same text.
    pub fn generate_transcript(&self, statements: &[Statement], query: &str) -> String {
        let mut transcript = String::from("🏛️ COUNCIL SESSION TRANSCRIPT\n");
        transcript.push_str(&"═".repeat(39));
        transcript.push_str("\n\n");
        transcript.push_str(&format!("MATTER UNDER CONSIDERATION: {}\n\n", query));

        for round in 1..=3u32 {
            let round_statements: Vec<&Statement> =
                statements.iter().filter(|s| s.round == round).collect();
            if round_statements.is_empty() {
                continue;
            }

            transcript.push_str(&format!(
                "━━━ ROUND {}: {} ━━━\n\n",
                round,
                round_title(round).to_uppercase()
            ));

            for statement in round_statements {
                let (emoji, title) = self
                    .advisor_lookup(&statement.advisor_name)
                    .map(|a| (a.emoji.as_str(), a.title.as_str()))
                    .unwrap_or(("👤", "Unknown"));
                transcript.push_str(&format!(
                    "{} {} {}:\n\"{}\"\n\n",
                    emoji, statement.advisor_name, title, statement.statement
                ));
            }
        }

        transcript
    }

    /// Have Abbas the Silent Observer synthesize the whole session through
    /// the first available provider. This is the one deliberately
    /// single-pointed call in a session; its failure fails the session.
    pub async fn generate_summary(
        &self,
        statements: &[Statement],
        query: &str,
    ) -> Result<String, ProviderError> {
        let all_statements = statements
            .iter()
            .map(|s| format!("{}: {}", s.advisor_name, s.statement))
            .collect::<Vec<_>>()
            .join("\n");

        let summary_prompt = format!(
            "You are Abbas the Silent Observer, a eunuch advisor in the council. You rarely speak, but when you do, it cuts straight to the heart of the matter with profound insight. You've been listening to this entire council session about: \"{query}\"\n\nHere are all the advisor statements from your fellow eunuch council members:\n{all_statements}\n\nAs Abbas, provide a 2-3 sentence summary that captures the essence of the council's wisdom. Speak in your characteristic style - thoughtful, concise, and with the weight of careful observation. Use phrases like \"What strikes me is...\" or \"The council's wisdom reveals...\" and occasionally include your signature style of long thoughtful pauses represented by \"...\" Remember, you are a eunuch advisor who has adapted to modern times but retains formal wisdom."
        );

        let response = self.coordinator.query_first(&summary_prompt).await?;
        Ok(response.content)
    }
}
