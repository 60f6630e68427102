//! Payment event handler - the asynchronous crediting path
//!
//! Per delivery: verify the signature over the raw bytes, classify the
//! event, credit at most once, acknowledge exactly once. The status code is
//! the whole protocol: 400 means drop it, 500 means redeliver, 200 means
//! done (credited or deliberately ignored).

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};
use std::sync::Arc;
use tracing::{debug, info};

use tinyagents_ledger::PURCHASE_GRANT;
use tinyagents_payments::{classify_event, PurchaseEvent};

use crate::error::{BotError, BotResult};
use crate::state::AppState;

/// Stripe webhook entry point
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> BotResult<StatusCode> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok());

    // No signature, no ledger access
    state.verifier.verify(&body, signature)?;

    match classify_event(&body)? {
        PurchaseEvent::Ignored { event_id, kind } => {
            // Acknowledge so the sender stops retrying events we don't act on
            debug!(%event_id, %kind, "ignoring event type");
            Ok(StatusCode::OK)
        }

        PurchaseEvent::MissingReference { event_id } => {
            debug!(%event_id, "completed checkout without a buyer reference");
            Err(BotError::MissingReference)
        }

        PurchaseEvent::Completed { event_id, user_id } => {
            if state.ledger.credit(user_id, PURCHASE_GRANT).await {
                info!(%event_id, user_id, grant = PURCHASE_GRANT, "credits granted");
                Ok(StatusCode::OK)
            } else {
                Err(BotError::CreditFailed)
            }
        }
    }
}
