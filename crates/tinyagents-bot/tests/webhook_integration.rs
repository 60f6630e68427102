//! Webhook integration tests
//!
//! Drives the full axum router with in-memory collaborators: a counting
//! ledger, a recording transport, and a scripted completion provider. The
//! checkout client is left unconfigured so the `/buy` path exercises the
//! configuration-error branch without touching the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::Mutex;
use tower::ServiceExt;

use tinyagents_agents::InferenceGateway;
use tinyagents_bot::{create_router, AppState};
use tinyagents_ledger::{CreditLedger, MemoryLedger};
use tinyagents_llm::{
    CompletionProvider, CompletionRequest, CompletionResponse, LlmError, ProviderKind,
};
use tinyagents_payments::{CheckoutClient, StripeConfig, WebhookVerifier};
use tinyagents_telegram::ChatTransport;

const WEBHOOK_SECRET: &str = "whsec_test";

// =============================================================================
// Test doubles
// =============================================================================

/// Ledger wrapper that counts operations and can be told to fail credits
struct CountingLedger {
    inner: MemoryLedger,
    reads: AtomicUsize,
    debits: AtomicUsize,
    credits: AtomicUsize,
    fail_credits: bool,
}

impl CountingLedger {
    fn new() -> Self {
        Self {
            inner: MemoryLedger::new(),
            reads: AtomicUsize::new(0),
            debits: AtomicUsize::new(0),
            credits: AtomicUsize::new(0),
            fail_credits: false,
        }
    }

    fn failing_credits() -> Self {
        Self {
            fail_credits: true,
            ..Self::new()
        }
    }

    fn operations(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
            + self.debits.load(Ordering::SeqCst)
            + self.credits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreditLedger for CountingLedger {
    async fn balance(&self, user_id: i64) -> u64 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.balance(user_id).await
    }

    async fn debit_one(&self, user_id: i64) -> bool {
        self.debits.fetch_add(1, Ordering::SeqCst);
        self.inner.debit_one(user_id).await
    }

    async fn credit(&self, user_id: i64, amount: u64) -> bool {
        self.credits.fetch_add(1, Ordering::SeqCst);
        if self.fail_credits {
            return false;
        }
        self.inner.credit(user_id, amount).await
    }
}

/// Transport that records every outbound message
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingTransport {
    async fn messages(&self) -> Vec<(i64, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> tinyagents_telegram::types::Result<()> {
        self.sent.lock().await.push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> tinyagents_telegram::types::Result<()> {
        self.sent.lock().await.push((chat_id, text.to_string()));
        Ok(())
    }
}

/// Provider that counts calls and returns a fixed reply
struct ScriptedProvider {
    reply: &'static str,
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedProvider {
    fn ok(reply: &'static str) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok("")
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Deterministic
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> tinyagents_llm::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::RequestFailed {
                message: "HTTP 500".to_string(),
            });
        }
        Ok(CompletionResponse::new(self.reply))
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    router: Router,
    ledger: Arc<CountingLedger>,
    transport: Arc<RecordingTransport>,
    provider: Arc<ScriptedProvider>,
}

fn harness() -> Harness {
    harness_with_ledger(Arc::new(CountingLedger::new()))
}

fn harness_with_ledger(ledger: Arc<CountingLedger>) -> Harness {
    harness_with(ledger, Arc::new(ScriptedProvider::ok("generated reply")))
}

fn harness_with(ledger: Arc<CountingLedger>, provider: Arc<ScriptedProvider>) -> Harness {
    let transport = Arc::new(RecordingTransport::default());

    let state = AppState::new(
        ledger.clone(),
        transport.clone(),
        InferenceGateway::new(provider.clone()),
        CheckoutClient::new(StripeConfig::new("", "", "TinyAgents_bot")),
        WebhookVerifier::new(WEBHOOK_SECRET),
    );

    Harness {
        router: create_router(Arc::new(state)),
        ledger,
        transport,
        provider,
    }
}

fn telegram_update(user_id: i64, chat_id: i64, text: &str) -> String {
    serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 99,
            "date": 1441645532,
            "chat": {"id": chat_id, "type": "private"},
            "from": {"id": user_id, "is_bot": false, "first_name": "Test"},
            "text": text
        }
    })
    .to_string()
}

async fn post(router: &Router, uri: &str, body: impl Into<Body>, signature: Option<&str>) -> StatusCode {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(signature) = signature {
        request = request.header("Stripe-Signature", signature);
    }
    let response = router
        .clone()
        .oneshot(request.body(body.into()).unwrap())
        .await
        .unwrap();
    response.status()
}

async fn send_text(h: &Harness, user_id: i64, text: &str) -> StatusCode {
    post(
        &h.router,
        "/webhook/telegram",
        telegram_update(user_id, user_id, text),
        None,
    )
    .await
}

fn sign(payload: &[u8]) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

fn completed_event(user_ref: Option<&str>) -> String {
    let object = match user_ref {
        Some(user_ref) => serde_json::json!({"client_reference_id": user_ref}),
        None => serde_json::json!({}),
    };
    serde_json::json!({
        "id": "evt_test",
        "type": "checkout.session.completed",
        "data": {"object": object}
    })
    .to_string()
}

// =============================================================================
// Interactive path
// =============================================================================

#[tokio::test]
async fn start_lists_the_agent_catalog() {
    let h = harness();
    assert_eq!(send_text(&h, 10, "/start").await, StatusCode::OK);

    let sent = h.transport.messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("/meme_persona"));
    assert!(sent[0].1.contains("/roast_generator"));
    assert!(sent[0].1.contains("/buy"));
}

#[tokio::test]
async fn credits_reports_the_balance() {
    let h = harness();
    h.ledger.inner.set_balance(10, 7).await;

    assert_eq!(send_text(&h, 10, "/credits").await, StatusCode::OK);

    let sent = h.transport.messages().await;
    assert!(sent[0].1.contains("*7*"));
}

#[tokio::test]
async fn agent_command_debits_then_generates() {
    let h = harness();
    h.ledger.inner.set_balance(10, 3).await;

    assert_eq!(send_text(&h, 10, "/meme_persona cat playing piano").await, StatusCode::OK);

    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.ledger.inner.balance(10).await, 2);

    let sent = h.transport.messages().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.contains("Credit used"));
    assert!(sent[0].1.contains("*2*"));
    assert_eq!(sent[1].1, "generated reply");
}

#[tokio::test]
async fn failed_generation_still_costs_the_credit() {
    let ledger = Arc::new(CountingLedger::new());
    let h = harness_with(ledger, Arc::new(ScriptedProvider::failing()));
    h.ledger.inner.set_balance(10, 3).await;

    assert_eq!(send_text(&h, 10, "/meme_persona anything").await, StatusCode::OK);

    // Cost-before-call: the debit is not refunded, the fallback is sent
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.ledger.inner.balance(10).await, 2);

    let sent = h.transport.messages().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].1, tinyagents_agents::GENERATION_FALLBACK);
}

#[tokio::test]
async fn zero_balance_never_reaches_the_provider() {
    let h = harness();

    assert_eq!(send_text(&h, 10, "/meme_persona anything").await, StatusCode::OK);

    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.ledger.debits.load(Ordering::SeqCst), 0);
    assert_eq!(h.ledger.inner.balance(10).await, 0);

    let sent = h.transport.messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Out of credits"));
}

#[tokio::test]
async fn unknown_command_is_reported_without_side_effects() {
    let h = harness();

    assert_eq!(send_text(&h, 10, "/unknownthing hello").await, StatusCode::OK);

    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.ledger.operations(), 0);

    let sent = h.transport.messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Unrecognized command"));
}

#[tokio::test]
async fn agent_command_without_argument_gets_usage_hint() {
    let h = harness();
    h.ledger.inner.set_balance(10, 3).await;

    assert_eq!(send_text(&h, 10, "/meme_persona").await, StatusCode::OK);

    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.ledger.inner.balance(10).await, 3);

    let sent = h.transport.messages().await;
    assert!(sent[0].1.contains("/meme_persona [your request]"));
}

#[tokio::test]
async fn buy_renders_the_configuration_error_verbatim() {
    let h = harness();

    assert_eq!(send_text(&h, 10, "/buy").await, StatusCode::OK);

    let sent = h.transport.messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("STRIPE_SECRET_KEY"));
}

#[tokio::test]
async fn start_deep_links_render_notices() {
    let h = harness();

    send_text(&h, 10, "/start success_10").await;
    send_text(&h, 10, "/start cancel_10").await;

    let sent = h.transport.messages().await;
    assert_eq!(sent.len(), 2);
    // The unauthenticated redirect must not claim the money moved
    assert!(sent[0].1.contains("Once your payment is confirmed"));
    assert!(sent[1].1.contains("Payment cancelled"));
    // The deep link alone credits nothing
    assert_eq!(h.ledger.credits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn plain_text_is_acknowledged_silently() {
    let h = harness();

    assert_eq!(send_text(&h, 10, "just chatting").await, StatusCode::OK);

    assert!(h.transport.messages().await.is_empty());
    assert_eq!(h.ledger.operations(), 0);
}

#[tokio::test]
async fn malformed_update_is_still_acknowledged() {
    let h = harness();
    let status = post(&h.router, "/webhook/telegram", "not json at all", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn non_message_update_is_acknowledged_empty() {
    let h = harness();
    let status = post(
        &h.router,
        "/webhook/telegram",
        r#"{"update_id": 5, "edited_message": {}}"#,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.transport.messages().await.is_empty());
}

// =============================================================================
// Payment path
// =============================================================================

#[tokio::test]
async fn completed_checkout_credits_the_referenced_user() {
    let h = harness();
    let payload = completed_event(Some("42"));
    let signature = sign(payload.as_bytes());

    let status = post(&h.router, "/webhook/stripe", payload, Some(&signature)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.ledger.inner.balance(42).await, 100);
}

#[tokio::test]
async fn invalid_signature_is_rejected_before_any_ledger_access() {
    let h = harness();
    let payload = completed_event(Some("42"));

    let status = post(
        &h.router,
        "/webhook/stripe",
        payload,
        Some("t=1,v1=deadbeef"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.ledger.operations(), 0);
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let h = harness();
    let status = post(&h.router, "/webhook/stripe", completed_event(Some("42")), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.ledger.operations(), 0);
}

#[tokio::test]
async fn ignored_event_type_is_idempotent_across_redelivery() {
    let h = harness();
    let payload = serde_json::json!({
        "id": "evt_other",
        "type": "payment_intent.succeeded",
        "data": {"object": {}}
    })
    .to_string();
    let signature = sign(payload.as_bytes());

    for _ in 0..2 {
        let status = post(&h.router, "/webhook/stripe", payload.clone(), Some(&signature)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(h.ledger.operations(), 0);
}

#[tokio::test]
async fn completed_checkout_without_reference_is_a_client_error() {
    let h = harness();
    let payload = completed_event(None);
    let signature = sign(payload.as_bytes());

    let status = post(&h.router, "/webhook/stripe", payload, Some(&signature)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.ledger.credits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_increment_asks_for_redelivery() {
    let h = harness_with_ledger(Arc::new(CountingLedger::failing_credits()));
    let payload = completed_event(Some("42"));
    let signature = sign(payload.as_bytes());

    let status = post(&h.router, "/webhook/stripe", payload, Some(&signature)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.ledger.credits.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
