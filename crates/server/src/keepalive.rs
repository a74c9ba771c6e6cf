use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing::{error, info};

pub const KEEP_ALIVE_BODY: &str = "Dattebayo! The bot is guarding the village. 🍃";

pub fn router() -> Router {
    Router::new().route("/", get(home))
}

async fn home() -> &'static str {
    KEEP_ALIVE_BODY
}

/// Binds the keep-alive listener and serves it in the background.
///
/// Returns the bound address. Errors after startup are logged and never
/// reach the bot.
pub async fn spawn(bind_address: &str, port: u16) -> std::io::Result<SocketAddr> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let local_address = listener.local_addr()?;

    info!(
        event_name = "system.keepalive.start",
        correlation_id = "bootstrap",
        bind_address = %local_address,
        "keep-alive endpoint started"
    );

    tokio::spawn(async move {
        if let Err(serve_error) = axum::serve(listener, router()).await {
            error!(
                event_name = "system.keepalive.error",
                correlation_id = "bootstrap",
                error = %serve_error,
                "keep-alive endpoint terminated unexpectedly"
            );
        }
    });

    Ok(local_address)
}
