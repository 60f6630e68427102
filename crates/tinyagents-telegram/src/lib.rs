//! TinyAgents Telegram - Bot API transport
//!
//! Inbound: the update envelope Telegram POSTs at the webhook. Outbound:
//! `sendMessage` through [`TelegramClient`]. The [`ChatTransport`] trait is
//! the seam the command router talks through, so routing logic is testable
//! without the network.

pub mod client;
pub mod types;

pub use client::{TelegramClient, TelegramConfig};
pub use types::{Chat, ChatTransport, IncomingMessage, TransportError, Update, User};
