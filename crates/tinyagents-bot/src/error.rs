//! Webhook error handling
//!
//! Only the payment path speaks through status codes; these map the
//! state-machine outcomes onto them. The interactive path never returns an
//! error to the transport at all.

use axum::{http::StatusCode, response::IntoResponse, response::Response};
use thiserror::Error;

use tinyagents_payments::{SignatureError, WebhookError};

pub type BotResult<T> = Result<T, BotError>;

/// Failures on the payment webhook path
#[derive(Debug, Error)]
pub enum BotError {
    #[error("signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("event payload unusable: {0}")]
    Payload(#[from] WebhookError),

    #[error("completed checkout carries no correlation reference")]
    MissingReference,

    #[error("ledger increment failed")]
    CreditFailed,
}

impl BotError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Client errors: do not retry, nothing was credited
            BotError::Signature(_) | BotError::Payload(_) | BotError::MissingReference => {
                StatusCode::BAD_REQUEST
            }
            // Server error: the sender should redeliver
            BotError::CreditFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "payment webhook rejected");
        self.status_code().into_response()
    }
}
