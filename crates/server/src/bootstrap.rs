use std::sync::Arc;

use animebot_core::{
    config::{AppConfig, ConfigError, LoadOptions, LoadedConfig},
    AuthorizationGate, ResponseFormatter,
};
use animebot_discord::{dispatch::CommandDispatcher, gateway::GatewayError};
use animebot_search::{ChatProvider, DuckDuckGoChat, QueryExecutor};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub dispatcher: Arc<CommandDispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub fn load_config(options: LoadOptions) -> Result<LoadedConfig, BootstrapError> {
    Ok(AppConfig::load(options)?)
}

/// Wires the command pipeline against DuckDuckGo.
pub fn assemble(config: AppConfig) -> Application {
    let provider = Arc::new(DuckDuckGoChat::from_config(&config.search));
    assemble_with_provider(config, provider)
}

pub fn assemble_with_provider(config: AppConfig, provider: Arc<dyn ChatProvider>) -> Application {
    let dispatcher = CommandDispatcher::new(
        AuthorizationGate::from_config(&config.discord),
        QueryExecutor::new(provider, config.search.model.clone()),
        ResponseFormatter::from_config(&config.reply),
        config.reply.denial_message.clone(),
    );

    info!(
        event_name = "system.bootstrap.assembled",
        correlation_id = "bootstrap",
        allowed_server_id = %config.discord.allowed_server_id,
        dm_only = config.is_dm_only(),
        search_model = %config.search.model,
        "command pipeline assembled"
    );

    Application { config, dispatcher: Arc::new(dispatcher) }
}

/// Human-readable configuration for `--check`. The token is never printed.
pub fn config_summary(config: &AppConfig) -> String {
    let allowed = if config.is_dm_only() {
        "direct messages only".to_owned()
    } else {
        format!("server {} and direct messages", config.discord.allowed_server_id)
    };

    [
        "discord.token = [REDACTED]".to_owned(),
        format!("discord.allowed = {allowed}"),
        format!("search.base_url = {}", config.search.base_url),
        format!("search.model = {}", config.search.model),
        format!("search.timeout_secs = {}", config.search.timeout_secs),
        format!("server.listen = {}:{}", config.server.bind_address, config.server.port),
        format!("logging.level = {}", config.logging.level),
        format!("logging.format = {:?}", config.logging.format),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use animebot_core::{config::AppConfig, InvocationContext, ScopeId, UserId};
    use animebot_discord::dispatch::{
        DispatchState, InteractionResponder, Invocation, ResponderError,
    };
    use animebot_search::{ChatProvider, ProviderError};
    use async_trait::async_trait;

    use super::{assemble_with_provider, config_summary};

    struct EchoProvider;

    impl ChatProvider for EchoProvider {
        fn chat(&self, _prompt: &str, model: &str) -> Result<String, ProviderError> {
            Ok(format!("answered by {model}"))
        }
    }

    #[derive(Default)]
    struct CapturingResponder {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InteractionResponder for CapturingResponder {
        async fn deny(&self, message: &str) -> Result<(), ResponderError> {
            self.messages.lock().expect("lock").push(message.to_owned());
            Ok(())
        }

        async fn acknowledge(&self) -> Result<(), ResponderError> {
            Ok(())
        }

        async fn follow_up(&self, message: &str) -> Result<(), ResponderError> {
            self.messages.lock().expect("lock").push(message.to_owned());
            Ok(())
        }
    }

    fn config(allowed: u64) -> AppConfig {
        let mut config = AppConfig::default();
        config.discord.token = "discord-secret-token".to_owned().into();
        config.discord.allowed_server_id = ScopeId(allowed);
        config.search.model = "test-model".to_owned();
        config.reply.signature = " -- bot".to_owned();
        config.reply.denial_message = "not here".to_owned();
        config
    }

    fn invocation(scope: Option<u64>, responder: Arc<CapturingResponder>) -> Invocation {
        Invocation {
            context: InvocationContext {
                correlation_id: "boot-1".to_owned(),
                invoking_user_id: UserId(5),
                originating_scope_id: scope.map(ScopeId),
                query_text: "dan da dan".to_owned(),
            },
            responder,
        }
    }

    #[tokio::test]
    async fn pipeline_uses_configured_denial_message() {
        let app = assemble_with_provider(config(111), Arc::new(EchoProvider));
        let responder = Arc::new(CapturingResponder::default());

        let report =
            app.dispatcher.dispatch(invocation(Some(999), responder.clone())).await.expect("ok");

        assert_eq!(report.final_state(), DispatchState::Denied);
        assert_eq!(*responder.messages.lock().expect("lock"), vec!["not here".to_owned()]);
    }

    #[tokio::test]
    async fn pipeline_uses_configured_model_and_signature() {
        let app = assemble_with_provider(config(111), Arc::new(EchoProvider));
        let responder = Arc::new(CapturingResponder::default());

        let report = app.dispatcher.dispatch(invocation(None, responder)).await.expect("ok");

        assert_eq!(report.reply.as_deref(), Some("answered by test-model -- bot"));
    }

    #[test]
    fn summary_redacts_token() {
        let summary = config_summary(&config(111));

        assert!(!summary.contains("discord-secret-token"));
        assert!(summary.contains("discord.token = [REDACTED]"));
        assert!(summary.contains("server 111 and direct messages"));
        assert!(summary.contains("server.listen = 0.0.0.0:8080"));
    }

    #[test]
    fn summary_reports_dm_only_mode() {
        assert!(config_summary(&config(0)).contains("direct messages only"));
    }
}
