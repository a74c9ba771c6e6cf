use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use serenity::{
    all::{
        ActivityData, Command, CommandInteraction, Context, EventHandler, GatewayIntents, Http,
        Interaction, Ready,
    },
    builder::{
        CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage,
    },
    Client,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    commands::{
        ai_command, normalize_ai_command, CommandParseError, SlashCommandPayload,
        QUERY_OPTION_NAME,
    },
    dispatch::{InteractionResponder, Invocation, ResponderError},
};

pub const PRESENCE_TEXT: &str = "anime updates | /ai";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to build discord client: {0}")]
    Build(#[source] serenity::Error),
    #[error("discord gateway session ended: {0}")]
    Session(#[source] serenity::Error),
}

/// Receives gateway events and forwards `/ai` invocations to the dispatcher.
pub struct GatewayHandler {
    sender: mpsc::Sender<Invocation>,
    commands_synced: AtomicBool,
}

impl GatewayHandler {
    pub fn new(sender: mpsc::Sender<Invocation>) -> Self {
        Self { sender, commands_synced: AtomicBool::new(false) }
    }

    async fn sync_commands(&self, http: &Http) {
        if self.commands_synced.swap(true, Ordering::SeqCst) {
            return;
        }

        match Command::set_global_commands(http, vec![ai_command()]).await {
            Ok(registered) => info!(
                event_name = "gateway.commands.synced",
                count = registered.len(),
                "slash commands registered"
            ),
            Err(sync_error) => {
                // Retried on the next ready event.
                self.commands_synced.store(false, Ordering::SeqCst);
                error!(
                    event_name = "gateway.commands.sync_failed",
                    error = %sync_error,
                    "slash command registration failed"
                );
            }
        }
    }
}

#[async_trait]
impl EventHandler for GatewayHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.sync_commands(&ctx.http).await;
        ctx.set_activity(Some(ActivityData::watching(PRESENCE_TEXT)));
        info!(
            event_name = "gateway.ready",
            bot_user = %ready.user.name,
            bot_id = ready.user.id.get(),
            guilds = ready.guilds.len(),
            "logged in to discord"
        );
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let context = match normalize_ai_command(payload_from_interaction(&command)) {
            Ok(context) => context,
            Err(CommandParseError::UnsupportedCommand(name)) => {
                debug!(event_name = "gateway.command.ignored", command = %name, "unknown command");
                return;
            }
            Err(parse_error) => {
                warn!(
                    event_name = "gateway.command.rejected",
                    interaction_id = command.id.get(),
                    error = %parse_error,
                    "ai command could not be parsed"
                );
                return;
            }
        };

        let responder = Arc::new(SerenityResponder { http: Arc::clone(&ctx.http), command });
        if self.sender.send(Invocation { context, responder }).await.is_err() {
            warn!(event_name = "gateway.dispatcher_closed", "dispatcher is no longer running");
        }
    }
}

pub fn payload_from_interaction(command: &CommandInteraction) -> SlashCommandPayload {
    let query = command
        .data
        .options
        .iter()
        .find(|option| option.name == QUERY_OPTION_NAME)
        .and_then(|option| option.value.as_str())
        .map(str::to_owned);

    SlashCommandPayload {
        command: command.data.name.clone(),
        query,
        user_id: command.user.id.get(),
        guild_id: command.guild_id.map(|guild_id| guild_id.get()),
        interaction_id: command.id.get().to_string(),
    }
}

struct SerenityResponder {
    http: Arc<Http>,
    command: CommandInteraction,
}

#[async_trait]
impl InteractionResponder for SerenityResponder {
    async fn deny(&self, message: &str) -> Result<(), ResponderError> {
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content(message).ephemeral(true),
        );
        self.command.create_response(self.http.as_ref(), response).await.map_err(platform_error)
    }

    async fn acknowledge(&self) -> Result<(), ResponderError> {
        self.command.defer(self.http.as_ref()).await.map_err(platform_error)
    }

    async fn follow_up(&self, message: &str) -> Result<(), ResponderError> {
        let followup = CreateInteractionResponseFollowup::new().content(message);
        self.command
            .create_followup(self.http.as_ref(), followup)
            .await
            .map(|_| ())
            .map_err(platform_error)
    }
}

fn platform_error(error: serenity::Error) -> ResponderError {
    ResponderError::Platform(error.to_string())
}

/// Connects to the Discord gateway and runs until the session ends.
pub async fn run_gateway(
    token: &str,
    sender: mpsc::Sender<Invocation>,
) -> Result<(), GatewayError> {
    let mut client = Client::builder(token, GatewayIntents::non_privileged())
        .event_handler(GatewayHandler::new(sender))
        .await
        .map_err(GatewayError::Build)?;

    info!(event_name = "gateway.connecting", "connecting to discord gateway");
    client.start().await.map_err(GatewayError::Session)
}
