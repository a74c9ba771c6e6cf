use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Quota,
    Upstream,
    MalformedResponse,
    Worker,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "Network error",
            Self::Quota => "Quota exceeded",
            Self::Upstream => "Search provider error",
            Self::MalformedResponse => "Malformed response",
            Self::Worker => "Search worker crashed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A failed search, rendered exactly as the user will see it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("❌ {kind}: {message}")]
pub struct SearchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SearchFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

pub type SearchOutcome = Result<String, SearchFailure>;

/// Collapses an outcome into reply text.
///
/// Failures are shown to the user as an ordinary message, so past this point
/// the pipeline carries a single text channel.
pub fn outcome_text(outcome: SearchOutcome) -> String {
    match outcome {
        Ok(text) => text,
        Err(failure) => failure.to_string(),
    }
}
