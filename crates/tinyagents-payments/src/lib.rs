//! TinyAgents Payments - Stripe integration
//!
//! Two independent halves:
//!
//! - **Checkout**: create a hosted checkout session for the single
//!   fixed-price credit pack, tagged with the Telegram user id so the
//!   asynchronous confirmation can be matched back to a ledger row.
//! - **Webhook**: verify the `Stripe-Signature` header over the raw payload
//!   bytes and classify the event. Only `checkout.session.completed`
//!   carries money meaning; everything else is acknowledged and dropped.
//!
//! Verification failures are always client errors and never touch the
//! ledger.

pub mod checkout;
pub mod webhook;

pub use checkout::{CheckoutClient, PaymentError, StripeConfig};
pub use webhook::{classify_event, PurchaseEvent, SignatureError, WebhookError, WebhookVerifier};
