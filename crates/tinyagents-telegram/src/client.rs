//! Bot API client

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::types::{ChatTransport, Result, TransportError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Bot API client
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub token: String,
    /// API base, overridable for tests
    pub api_base: String,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: std::env::var("TINYAGENTS_TELEGRAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Outbound `sendMessage` client
pub struct TelegramClient {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    async fn send(&self, body: SendMessage<'_>) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send(SendMessage {
            chat_id,
            text,
            parse_mode: None,
        })
        .await
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send(SendMessage {
            chat_id,
            text,
            parse_mode: Some("Markdown"),
        })
        .await
    }
}
