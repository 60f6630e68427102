//! Purchase-event ingestion
//!
//! Stripe signs every delivery with `Stripe-Signature: t=<unix>,v1=<hex>`
//! where `v1` is HMAC-SHA256 over `"{t}.{raw payload}"` under the shared
//! signing secret. Verification compares in constant time and rejects
//! timestamps outside the tolerance window.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// How far a signed timestamp may drift from the receiver's clock.
const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Signature verification failures. Always a client error; the ledger is
/// never touched on any of these.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    MissingHeader,

    #[error("signature header malformed")]
    MalformedHeader,

    #[error("signed timestamp outside tolerance")]
    StaleTimestamp,

    #[error("signature mismatch")]
    BadSignature,
}

/// Event payload failures
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),
}

/// Verifies `Stripe-Signature` headers against the shared signing secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Verify a delivery against the current clock.
    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        self.verify_at(payload, header, now)
    }

    /// Verify a delivery against an explicit clock. Split out so tests can
    /// pin time.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::MissingHeader)?;

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<Vec<u8>> = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or(SignatureError::MalformedHeader)?;
            match key {
                "t" => {
                    timestamp =
                        Some(value.parse().map_err(|_| SignatureError::MalformedHeader)?);
                }
                "v1" => {
                    let bytes =
                        hex::decode(value).map_err(|_| SignatureError::MalformedHeader)?;
                    candidates.push(bytes);
                }
                // Unknown schemes (v0 test-mode signatures etc.) are skipped
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if candidates.is_empty() {
            return Err(SignatureError::MalformedHeader);
        }
        if (now_unix - timestamp).abs() > self.tolerance_secs {
            return Err(SignatureError::StaleTimestamp);
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| SignatureError::BadSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        for candidate in &candidates {
            if candidate.ct_eq(expected.as_slice()).into() {
                return Ok(());
            }
        }
        Err(SignatureError::BadSignature)
    }
}

/// Outcome of classifying a verified event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseEvent {
    /// A completed checkout with a usable correlation reference
    Completed { event_id: String, user_id: i64 },
    /// A completed checkout with no way to find the buyer
    MissingReference { event_id: String },
    /// Any event type the bot does not act on
    Ignored { event_id: String, kind: String },
}

#[derive(Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: StripeEventData,
}

#[derive(Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

/// Classify a verified payload.
///
/// Only `checkout.session.completed` proceeds toward crediting; everything
/// else must be acknowledged without action so the sender stops retrying.
pub fn classify_event(payload: &[u8]) -> Result<PurchaseEvent, WebhookError> {
    let event: StripeEvent = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    if event.kind != "checkout.session.completed" {
        return Ok(PurchaseEvent::Ignored {
            event_id: event.id,
            kind: event.kind,
        });
    }

    let user_id = event
        .data
        .object
        .get("client_reference_id")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<i64>().ok());

    match user_id {
        Some(user_id) => Ok(PurchaseEvent::Completed {
            event_id: event.id,
            user_id,
        }),
        None => Ok(PurchaseEvent::MissingReference { event_id: event.id }),
    }
}
