//! Core of the anime search bot: configuration and the pure pieces of the
//! command pipeline.
//!
//! - `config` - layered configuration (defaults, TOML file, environment)
//! - `authorization` - which servers may use the bot
//! - `formatter` - footer and length limits for replies
//! - `errors` - search failures and their user-facing text

pub mod authorization;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatter;

pub use authorization::{AuthorizationDecision, AuthorizationGate, DenialReason};
pub use domain::{InvocationContext, ScopeId, UserId};
pub use errors::{outcome_text, FailureKind, SearchFailure, SearchOutcome};
pub use formatter::ResponseFormatter;
