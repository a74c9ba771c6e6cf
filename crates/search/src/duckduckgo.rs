use std::time::Duration;

use animebot_core::config::SearchConfig;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{ChatProvider, ProviderError};

pub const STATUS_PATH: &str = "/duckchat/v1/status";
pub const CHAT_PATH: &str = "/duckchat/v1/chat";
pub const VQD_HEADER: &str = "x-vqd-4";
const VQD_ACCEPT_HEADER: &str = "x-vqd-accept";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// DuckDuckGo AI chat.
///
/// Each call opens a fresh conversation: fetch a `x-vqd-4` token from the
/// status endpoint, post the prompt, then read the event stream to the end.
/// The HTTP client is built per call so no connection state is shared between
/// invocations.
#[derive(Clone, Debug)]
pub struct DuckDuckGoChat {
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatFrame {
    message: Option<String>,
    action: Option<String>,
    status: Option<u16>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl DuckDuckGoChat {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_owned(), timeout }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    fn client(&self) -> Result<Client, ProviderError> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| ProviderError::Network(error.to_string()))
    }

    fn fetch_vqd(&self, client: &Client) -> Result<String, ProviderError> {
        let response = client
            .get(format!("{}{STATUS_PATH}", self.base_url))
            .header(VQD_ACCEPT_HEADER, "1")
            .send()
            .map_err(network_error)?;
        let response = ensure_success(response)?;

        response
            .headers()
            .get(VQD_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Malformed(
                    "status endpoint did not return a conversation token".to_owned(),
                )
            })
    }
}

impl ChatProvider for DuckDuckGoChat {
    fn chat(&self, prompt: &str, model: &str) -> Result<String, ProviderError> {
        let client = self.client()?;
        let vqd = self.fetch_vqd(&client)?;
        debug!(
            event_name = "search.duckduckgo.token_acquired",
            model,
            "conversation token acquired"
        );

        let request =
            ChatRequest { model, messages: vec![ChatMessage { role: "user", content: prompt }] };
        let response = client
            .post(format!("{}{CHAT_PATH}", self.base_url))
            .header(VQD_HEADER, vqd)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .map_err(network_error)?;
        let response = ensure_success(response)?;
        let body = response.text().map_err(network_error)?;

        parse_chat_stream(&body)
    }
}

/// Joins the `message` fragments of a DuckDuckGo chat event stream.
pub fn parse_chat_stream(body: &str) -> Result<String, ProviderError> {
    let mut answer = String::new();

    for line in body.lines() {
        let Some(data) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() {
            continue;
        }
        if data == "[DONE]" {
            break;
        }

        let frame: ChatFrame = serde_json::from_str(data).map_err(|error| {
            ProviderError::Malformed(format!("unreadable stream frame: {error}"))
        })?;

        if frame.action.as_deref() == Some("error") {
            let detail = frame.kind.unwrap_or_else(|| "unknown error".to_owned());
            return Err(match frame.status {
                Some(429) => ProviderError::Quota(detail),
                Some(status) => ProviderError::Status { status, detail },
                None => ProviderError::Malformed(detail),
            });
        }

        if let Some(message) = frame.message {
            answer.push_str(&message);
        }
    }

    if answer.trim().is_empty() {
        return Err(ProviderError::Malformed("provider returned an empty answer".to_owned()));
    }

    Ok(answer)
}

fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail: String =
        response.text().unwrap_or_default().chars().take(MAX_ERROR_DETAIL_CHARS).collect();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let detail = if detail.trim().is_empty() { status.to_string() } else { detail };
        return Err(ProviderError::Quota(detail));
    }

    Err(ProviderError::Status { status: status.as_u16(), detail })
}

fn network_error(error: reqwest::Error) -> ProviderError {
    ProviderError::Network(error.to_string())
}
