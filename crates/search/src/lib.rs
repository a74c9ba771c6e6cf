//! Search - the external question-answering provider and the executor that
//! runs it off the event loop.
//!
//! - **Provider** (`provider`) - blocking `chat(prompt, model)` seam
//! - **DuckDuckGo** (`duckduckgo`) - the production provider (DuckDuckGo AI chat)
//! - **Executor** (`executor`) - prompt template, worker offload, failure capture

pub mod duckduckgo;
pub mod executor;
pub mod provider;

pub use duckduckgo::DuckDuckGoChat;
pub use executor::{build_prompt, QueryExecutor};
pub use provider::{ChatProvider, ProviderError};
