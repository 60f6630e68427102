//! Application state shared across handlers

use std::sync::Arc;

use tinyagents_agents::InferenceGateway;
use tinyagents_ledger::CreditLedger;
use tinyagents_payments::{CheckoutClient, WebhookVerifier};
use tinyagents_telegram::ChatTransport;

/// Shared application state
///
/// Ledger and transport sit behind trait objects so the routing logic can
/// be exercised against in-memory fakes.
pub struct AppState {
    /// The authoritative balance store
    pub ledger: Arc<dyn CreditLedger>,
    /// Outbound reply channel
    pub transport: Arc<dyn ChatTransport>,
    /// Completion provider behind the fixed sampling surface
    pub gateway: InferenceGateway,
    /// Hosted checkout session factory
    pub checkout: CheckoutClient,
    /// Purchase-event signature verification
    pub verifier: WebhookVerifier,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn CreditLedger>,
        transport: Arc<dyn ChatTransport>,
        gateway: InferenceGateway,
        checkout: CheckoutClient,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            ledger,
            transport,
            gateway,
            checkout,
            verifier,
        }
    }
}
