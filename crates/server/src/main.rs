mod bootstrap;
mod keepalive;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use animebot_core::config::{AppConfig, LoadOptions, LoggingConfig};
use animebot_discord::gateway::run_gateway;
use anyhow::Result;
use clap::Parser;
use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const INBOUND_CAPACITY: usize = 64;

/// Anime search bot for Discord.
#[derive(Debug, Parser)]
#[command(name = "animebot", version, about)]
struct Cli {
    /// TOML config file; must exist when given.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Validate configuration, print a summary and exit.
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            ..LoadOptions::default()
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    use animebot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match bootstrap::load_config(cli.load_options()) {
        Ok(loaded) => loaded,
        Err(config_error) => {
            init_logging(&AppConfig::default().logging);
            error!(
                event_name = "system.config.invalid",
                correlation_id = "bootstrap",
                error = %config_error,
                "configuration rejected; not starting"
            );
            return ExitCode::FAILURE;
        }
    };

    init_logging(&loaded.config.logging);
    for warning in &loaded.warnings {
        warn!(
            event_name = "system.config.warning",
            correlation_id = "bootstrap",
            warning = %warning,
            "configuration warning"
        );
    }

    if cli.check {
        println!("{}", bootstrap::config_summary(&loaded.config));
        return ExitCode::SUCCESS;
    }

    match run(loaded.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!(
                event_name = "system.server.failed",
                correlation_id = "runtime",
                error = %run_error,
                "animebot stopped with an error"
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let app = bootstrap::assemble(config);

    if let Err(bind_error) =
        keepalive::spawn(&app.config.server.bind_address, app.config.server.port).await
    {
        error!(
            event_name = "system.keepalive.bind_failed",
            correlation_id = "bootstrap",
            port = app.config.server.port,
            error = %bind_error,
            "keep-alive endpoint unavailable; continuing without it"
        );
    }

    let (sender, receiver) = mpsc::channel(INBOUND_CAPACITY);
    tokio::spawn(Arc::clone(&app.dispatcher).run(receiver));

    info!(event_name = "system.server.started", correlation_id = "bootstrap", "animebot started");

    let token = app.config.discord.token.expose_secret();
    tokio::select! {
        session = run_gateway(token, sender) => {
            session.map_err(bootstrap::BootstrapError::from)?;
            info!(event_name = "system.server.session_ended", "gateway session ended");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!(event_name = "system.server.stopping", correlation_id = "shutdown", "stopping");
        }
    }

    Ok(())
}
