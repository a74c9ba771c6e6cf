use std::sync::Arc;
use std::time::Instant;

use animebot_core::{outcome_text, FailureKind, SearchFailure, SearchOutcome};
use tracing::{debug, warn};

use crate::provider::ChatProvider;

pub fn build_prompt(query_text: &str) -> String {
    format!(
        "User Query: '{query_text}'. \
         Instructions: You are a helpful anime assistant. \
         1. Detect the language of the user's query (e.g., Bangla, English, Hindi). \
         2. Answer in that EXACT SAME language. \
         3. Provide the latest info/updates found."
    )
}

/// Runs one query against the search provider on tokio's blocking pool.
///
/// The provider call blocks on network I/O; the awaiting task is parked
/// instead, so the event loop keeps serving other invocations and the
/// keep-alive listener while the answer is fetched.
#[derive(Clone)]
pub struct QueryExecutor {
    provider: Arc<dyn ChatProvider>,
    model: String,
}

impl QueryExecutor {
    pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
        Self { provider, model: model.into() }
    }

    /// Tagged result of one search. Never panics and never propagates provider errors.
    pub async fn run(&self, query_text: &str) -> SearchOutcome {
        let provider = Arc::clone(&self.provider);
        let model = self.model.clone();
        let prompt = build_prompt(query_text);
        let started = Instant::now();

        let joined = tokio::task::spawn_blocking(move || provider.chat(&prompt, &model)).await;
        let outcome = match joined {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => Err(SearchFailure::new(
                FailureKind::MalformedResponse,
                "provider returned an empty answer",
            )),
            Ok(Err(error)) => Err(SearchFailure::from(error)),
            Err(join_error) => Err(SearchFailure::new(FailureKind::Worker, join_error.to_string())),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(text) => debug!(
                event_name = "search.query.completed",
                model = %self.model,
                elapsed_ms,
                answer_chars = text.chars().count(),
                "search provider answered"
            ),
            Err(failure) => warn!(
                event_name = "search.query.failed",
                model = %self.model,
                elapsed_ms,
                failure_kind = %failure.kind,
                error = %failure.message,
                "search provider call failed"
            ),
        }

        outcome
    }

    /// Reply text for one query; failures come back as `❌ <kind>: <message>`.
    pub async fn execute(&self, query_text: &str) -> String {
        outcome_text(self.run(query_text).await)
    }
}
