//! Route definitions

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Webhook and health routes
pub fn webhook_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/webhook/telegram", post(handlers::telegram::telegram_webhook))
        .route("/webhook/stripe", post(handlers::stripe::stripe_webhook))
}
