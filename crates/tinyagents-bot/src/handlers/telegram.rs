//! Command router - the interactive webhook path
//!
//! One inbound update, one routing pass, one acknowledgment. The handler
//! returns 200 unconditionally once the request body is in hand: Telegram
//! redelivers any other status, and a redelivered agent command would burn
//! a second credit.

use axum::{body::Bytes, extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::{debug, error, warn};

use tinyagents_agents::{find_agent, AgentDefinition};
use tinyagents_telegram::{TransportError, Update};

use crate::commands::{parse_command, start_outcome, Command, StartOutcome};
use crate::replies;
use crate::state::AppState;

/// Telegram webhook entry point
pub async fn telegram_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            // Acknowledged anyway; a parse failure must not loop forever
            warn!(error = %e, "unparseable update, acknowledging");
            return StatusCode::OK;
        }
    };

    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "non-message update");
        return StatusCode::OK;
    };
    let chat_id = message.chat.id;
    let (Some(text), Some(from)) = (message.text, message.from) else {
        debug!(update_id = update.update_id, "no text or sender");
        return StatusCode::OK;
    };

    if let Err(e) = route_message(&state, chat_id, from.id, &text).await {
        error!(chat_id, error = %e, "routing failed");
        // Best effort; the acknowledgment below stands either way
        if let Err(e) = state
            .transport
            .send_message(chat_id, &replies::internal_error())
            .await
        {
            error!(chat_id, error = %e, "could not report internal error");
        }
    }

    StatusCode::OK
}

/// Dispatch one parsed message. Errors here are transport failures only;
/// every domain failure has already been rendered into a reply.
async fn route_message(
    state: &AppState,
    chat_id: i64,
    user_id: i64,
    text: &str,
) -> Result<(), TransportError> {
    match parse_command(text) {
        Command::Start { payload } => match start_outcome(payload) {
            Some(StartOutcome::Success) => {
                state
                    .transport
                    .send_message(chat_id, &replies::payment_return_notice())
                    .await
            }
            Some(StartOutcome::Cancel) => {
                state
                    .transport
                    .send_message(chat_id, &replies::payment_cancelled())
                    .await
            }
            None => {
                state
                    .transport
                    .send_markdown(chat_id, &replies::welcome())
                    .await
            }
        },

        Command::Credits => {
            let credits = state.ledger.balance(user_id).await;
            state
                .transport
                .send_markdown(chat_id, &replies::balance(credits))
                .await
        }

        Command::Buy => match state.checkout.create_checkout_session(user_id).await {
            Ok(url) => {
                state
                    .transport
                    .send_markdown(chat_id, &replies::buy_link(&url))
                    .await
            }
            // The error text is the user-facing message, verbatim
            Err(e) => state.transport.send_message(chat_id, &e.to_string()).await,
        },

        Command::Other { name, argument } => match find_agent(name) {
            Some(agent) => match argument {
                Some(argument) => invoke_agent(state, chat_id, user_id, agent, argument).await,
                None => {
                    state
                        .transport
                        .send_markdown(chat_id, &replies::usage_hint(name))
                        .await
                }
            },
            None => {
                state
                    .transport
                    .send_message(chat_id, &replies::unrecognized())
                    .await
            }
        },

        Command::Plain => Ok(()),
    }
}

/// The gated sequence: read, refuse at zero, debit, then generate.
///
/// The debit strictly precedes the provider call so a zero-balance user can
/// never trigger paid inference. A generation that then fails is not
/// refunded; the gateway's fallback string is what gets sent.
async fn invoke_agent(
    state: &AppState,
    chat_id: i64,
    user_id: i64,
    agent: &AgentDefinition,
    argument: &str,
) -> Result<(), TransportError> {
    let balance = state.ledger.balance(user_id).await;
    if balance == 0 {
        return state
            .transport
            .send_markdown(chat_id, &replies::out_of_credits())
            .await;
    }

    if !state.ledger.debit_one(user_id).await {
        return state
            .transport
            .send_message(chat_id, &replies::debit_failed())
            .await;
    }

    // Informational: the balance observed before the debit, minus the debit
    state
        .transport
        .send_markdown(chat_id, &replies::credit_used(balance - 1))
        .await?;

    let reply = state.gateway.generate(agent, argument).await;
    state.transport.send_message(chat_id, &reply).await
}
