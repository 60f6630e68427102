//! Hosted checkout session creation
//!
//! One fixed-price line item, quantity 1, one-time payment. The success and
//! cancel URLs deep-link back into the chat with the user id and outcome
//! embedded; `client_reference_id` and metadata carry the same id for the
//! webhook to correlate on.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Checkout failures, rendered to the requesting user verbatim
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payments are not configured. Set STRIPE_SECRET_KEY and STRIPE_PRICE_ID.")]
    Config,

    #[error("Could not create a payment session. Please try again later.")]
    Gateway,
}

/// Configuration for the Stripe checkout client
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub secret_key: String,
    /// Price id of the credit pack (`price_...`)
    pub price_id: String,
    /// Bot username used to build the return deep links
    pub bot_name: String,
    /// API base, overridable for tests
    pub api_base: String,
}

impl StripeConfig {
    pub fn new(
        secret_key: impl Into<String>,
        price_id: impl Into<String>,
        bot_name: impl Into<String>,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            price_id: price_id.into(),
            bot_name: bot_name.into(),
            api_base: std::env::var("TINYAGENTS_STRIPE_BASE_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        }
    }

    fn is_complete(&self) -> bool {
        !self.secret_key.is_empty() && !self.price_id.is_empty()
    }
}

#[derive(Deserialize)]
struct CheckoutSession {
    url: Option<String>,
}

/// Client for creating hosted checkout sessions
pub struct CheckoutClient {
    config: StripeConfig,
    client: reqwest::Client,
}

impl CheckoutClient {
    pub fn new(config: StripeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Deep link the user lands on after the hosted page redirects.
    fn return_url(&self, outcome: &str, user_id: i64) -> String {
        format!(
            "https://t.me/{}?start={}_{}",
            self.config.bot_name, outcome, user_id
        )
    }

    /// Create a checkout session for one credit pack and return its URL.
    pub async fn create_checkout_session(&self, user_id: i64) -> Result<String, PaymentError> {
        if !self.config.is_complete() {
            return Err(PaymentError::Config);
        }

        let user_ref = user_id.to_string();
        let success_url = self.return_url("success", user_id);
        let cancel_url = self.return_url("cancel", user_id);
        let form: Vec<(&str, &str)> = vec![
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", &self.config.price_id),
            ("line_items[0][quantity]", "1"),
            ("mode", "payment"),
            ("success_url", &success_url),
            ("cancel_url", &cancel_url),
            ("client_reference_id", &user_ref),
            ("metadata[telegram_user_id]", &user_ref),
        ];

        let url = format!("{}/v1/checkout/sessions", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "checkout session request failed");
                PaymentError::Gateway
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "checkout session rejected");
            return Err(PaymentError::Gateway);
        }

        let session: CheckoutSession = response.json().await.map_err(|e| {
            error!(error = %e, "checkout session response unreadable");
            PaymentError::Gateway
        })?;

        session.url.ok_or(PaymentError::Gateway)
    }
}
