use animebot_core::{InvocationContext, ScopeId, UserId};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;
use thiserror::Error;

pub const AI_COMMAND_NAME: &str = "ai";
pub const AI_COMMAND_DESCRIPTION: &str =
    "Ask about anime updates (Auto-detects Bangla/English/Hindi)";
pub const QUERY_OPTION_NAME: &str = "query";
pub const QUERY_OPTION_DESCRIPTION: &str = "What do you want to know?";

/// Platform-neutral view of an incoming slash command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub query: Option<String>,
    pub user_id: u64,
    /// `None` when the command was used in a direct message.
    pub guild_id: Option<u64>,
    pub interaction_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
    #[error("`/ai` requires a non-empty `query` option")]
    MissingQuery,
}

/// The single command registered with Discord.
pub fn ai_command() -> CreateCommand {
    CreateCommand::new(AI_COMMAND_NAME).description(AI_COMMAND_DESCRIPTION).add_option(
        CreateCommandOption::new(
            CommandOptionType::String,
            QUERY_OPTION_NAME,
            QUERY_OPTION_DESCRIPTION,
        )
        .required(true),
    )
}

/// Validates an `/ai` payload and turns it into an invocation.
///
/// The query text is kept verbatim; it is only checked for being non-blank.
pub fn normalize_ai_command(
    payload: SlashCommandPayload,
) -> Result<InvocationContext, CommandParseError> {
    let command = payload.command.trim_start_matches('/');
    if command != AI_COMMAND_NAME {
        return Err(CommandParseError::UnsupportedCommand(payload.command));
    }

    let query_text = payload
        .query
        .filter(|query| !query.trim().is_empty())
        .ok_or(CommandParseError::MissingQuery)?;

    Ok(InvocationContext {
        correlation_id: payload.interaction_id,
        invoking_user_id: UserId(payload.user_id),
        originating_scope_id: payload.guild_id.map(ScopeId),
        query_text,
    })
}
