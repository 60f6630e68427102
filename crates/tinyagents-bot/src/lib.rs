//! TinyAgents Bot - Webhook surface
//!
//! Two independent entry points over shared state:
//!
//! ```text
//! POST /webhook/telegram   - one chat update in, commands routed, always 200
//! POST /webhook/stripe     - one signed purchase event in, 200/400/500 out
//! GET  /health             - liveness
//! ```
//!
//! The interactive path acknowledges success no matter what happened inside
//! (Telegram redelivers anything else); the payment path uses the status
//! code as its retry protocol.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod replies;
pub mod routes;
pub mod state;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::{BotError, BotResult};
pub use state::AppState;

/// Create the main router with all middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    routes::webhook_routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
