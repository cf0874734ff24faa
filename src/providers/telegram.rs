//! Telegram delivery sink.
//!
//! Sends one Markdown message per delivery: a bold header followed by a
//! numbered list of linked titles with italic summaries.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::DeliverySink;
use crate::error::{PipelineError, Result};
use crate::models::Article;

pub const DEFAULT_ENDPOINT: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramSink {
    client: Client,
    endpoint: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
    header: String,
}

impl std::fmt::Debug for TelegramSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSink")
            .field("endpoint", &self.endpoint)
            .field("chat_id", &self.chat_id)
            .field("has_token", &self.bot_token.is_some())
            .finish()
    }
}

impl TelegramSink {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        bot_token: Option<String>,
        chat_id: Option<String>,
        header: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            bot_token,
            chat_id,
            header: header.into(),
        }
    }
}

/// Render the message body for `articles`.
pub fn format_message(header: &str, articles: &[Article]) -> String {
    let mut msg = String::new();
    if !header.trim().is_empty() {
        msg.push_str(&format!("*{}*\n\n", header.trim()));
    }
    for (i, art) in articles.iter().enumerate() {
        msg.push_str(&format!(
            "{}. [{}]({})\n_{}_\n\n",
            i + 1,
            art.title,
            art.url,
            art.summary
        ));
    }
    msg.truncate(msg.trim_end().len());
    msg
}

fn interpret_response(body: &str) -> Result<()> {
    let parsed: TelegramResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::Delivery(format!("unexpected Telegram response: {e}")))?;
    if parsed.ok {
        return Ok(());
    }
    let code = parsed
        .error_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string());
    let description = parsed
        .description
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(PipelineError::Delivery(format!("TG error [{code}]: {description}")))
}

impl DeliverySink for TelegramSink {
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    async fn send(&self, articles: &[Article]) -> Result<()> {
        let (Some(token), Some(chat_id)) = (
            self.bot_token.as_deref().filter(|t| !t.trim().is_empty()),
            self.chat_id.as_deref().filter(|c| !c.trim().is_empty()),
        ) else {
            return Err(PipelineError::Delivery(
                "Missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID".to_string(),
            ));
        };

        let text = format_message(&self.header, articles);
        let url = format!(
            "{}/bot{}/sendMessage",
            self.endpoint.trim_end_matches('/'),
            token
        );

        let resp = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id,
                text: &text,
                parse_mode: "Markdown",
            })
            .send()
            .await
            // reqwest errors embed the URL, which carries the bot token.
            .map_err(|e| PipelineError::Delivery(format!("request failed: {}", e.without_url())))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PipelineError::Delivery(format!("could not read response: {}", e.without_url())))?;

        match interpret_response(&body) {
            Ok(()) => {
                info!(%status, "Sent to Telegram");
                Ok(())
            }
            Err(e) => {
                warn!(%status, error = %e, "Telegram rejected the message");
                Err(e)
            }
        }
    }
}
