use animebot_core::{FailureKind, SearchFailure};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Quota(String),
    #[error("provider answered with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("{0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::Quota(_) => FailureKind::Quota,
            Self::Status { .. } => FailureKind::Upstream,
            Self::Malformed(_) => FailureKind::MalformedResponse,
        }
    }
}

impl From<ProviderError> for SearchFailure {
    fn from(error: ProviderError) -> Self {
        SearchFailure::new(error.kind(), error.to_string())
    }
}

/// A conversational search backend answering one prompt at a time.
///
/// Calls are synchronous and may block on network I/O; callers on an async
/// runtime must move them to a blocking worker.
pub trait ChatProvider: Send + Sync {
    fn chat(&self, prompt: &str, model: &str) -> Result<String, ProviderError>;
}
