//! Inbound update envelope and the outbound transport seam

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Transport failures
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Bot API rejected request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// One webhook delivery from the Bot API
///
/// Only the fields the router reads are modeled; everything else in the
/// envelope is ignored by serde.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

/// An inbound chat message
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

/// Outbound message channel
///
/// Implementations must not panic; a failed send surfaces as a
/// [`TransportError`] the router logs and absorbs.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Plain-text reply.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Markdown-formatted reply.
    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_update_deserializes() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10000,
                "message": {
                    "message_id": 1365,
                    "date": 1441645532,
                    "chat": {"id": 1111, "type": "private", "first_name": "Test"},
                    "from": {"id": 2222, "is_bot": false, "first_name": "Test"},
                    "text": "/start"
                }
            }"#,
        )
        .unwrap();

        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 1111);
        assert_eq!(message.from.unwrap().id, 2222);
        assert_eq!(message.text.as_deref(), Some("/start"));
    }

    #[test]
    fn non_message_update_deserializes_empty() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 10001, "edited_message": {}}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn sticker_message_has_no_text() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10002,
                "message": {
                    "message_id": 1,
                    "date": 1441645532,
                    "chat": {"id": 1, "type": "private"}
                }
            }"#,
        )
        .unwrap();
        assert!(update.message.unwrap().text.is_none());
    }
}
