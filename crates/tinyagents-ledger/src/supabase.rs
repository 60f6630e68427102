//! Ledger backed by a Supabase (PostgREST) table
//!
//! The table holds one row per user: `id` (Telegram user id, primary key)
//! and `credits`. Mutations are conditional PATCHes filtered on the balance
//! the writer last observed (`credits=eq.{seen}`), retried a bounded number
//! of times. A concurrent writer makes the filter match nothing, the PATCH
//! reports zero rows, and the loop re-reads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

use crate::{CreditLedger, LedgerError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded retries for the compare-and-swap write loop.
const DEFAULT_CAS_ATTEMPTS: u32 = 3;

/// Configuration for the Supabase ledger
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Service-role key, sent as both `apikey` and bearer token
    pub service_key: String,
    /// Table name holding the balances
    pub table: String,
    /// Compare-and-swap attempts before giving up (fail-closed)
    pub cas_attempts: u32,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            table: "users".to_string(),
            cas_attempts: DEFAULT_CAS_ATTEMPTS,
        }
    }

    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok()?;
        let key = std::env::var("SUPABASE_KEY").ok()?;
        Some(Self::new(url, key))
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CreditRow {
    credits: u64,
}

#[derive(Debug, Serialize)]
struct NewRow {
    id: i64,
    credits: u64,
}

/// Credit ledger over the PostgREST surface of a Supabase table
pub struct SupabaseLedger {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseLedger {
    pub fn new(config: SupabaseConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    pub fn from_env() -> Option<Self> {
        Some(Self::new(SupabaseConfig::from_env()?))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    /// Read the stored balance, `None` when no row exists.
    async fn fetch(&self, user_id: i64) -> Result<Option<u64>> {
        let url = format!(
            "{}?id=eq.{}&select=credits",
            self.config.rest_url(),
            user_id
        );
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let rows: Vec<CreditRow> =
            response
                .json()
                .await
                .map_err(|e| LedgerError::MalformedRow {
                    message: e.to_string(),
                })?;

        Ok(rows.into_iter().next().map(|r| r.credits))
    }

    /// Insert a fresh row. `Ok(false)` means another writer created it first.
    async fn insert(&self, user_id: i64, credits: u64) -> Result<bool> {
        let response = self
            .authed(self.client.post(self.config.rest_url()))
            .header("Prefer", "return=minimal")
            .json(&NewRow {
                id: user_id,
                credits,
            })
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable {
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        Ok(true)
    }

    /// Conditional write: set `credits = next` only where the row still
    /// holds `seen`. `Ok(false)` means a concurrent writer got there first.
    async fn compare_and_swap(&self, user_id: i64, seen: u64, next: u64) -> Result<bool> {
        let url = format!(
            "{}?id=eq.{}&credits=eq.{}",
            self.config.rest_url(),
            user_id,
            seen
        );
        let response = self
            .authed(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "credits": next }))
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let updated: Vec<CreditRow> =
            response
                .json()
                .await
                .map_err(|e| LedgerError::MalformedRow {
                    message: e.to_string(),
                })?;

        Ok(!updated.is_empty())
    }

    async fn try_balance(&self, user_id: i64) -> Result<u64> {
        match self.fetch(user_id).await? {
            Some(credits) => Ok(credits),
            None => {
                // Lazy creation; losing the insert race is fine, the row
                // some other writer created is authoritative.
                self.insert(user_id, 0).await?;
                Ok(0)
            }
        }
    }

    async fn try_debit_one(&self, user_id: i64) -> Result<bool> {
        for _ in 0..self.config.cas_attempts {
            let seen = match self.fetch(user_id).await? {
                Some(credits) => credits,
                None => return Ok(false),
            };
            if seen == 0 {
                return Ok(false);
            }
            if self.compare_and_swap(user_id, seen, seen - 1).await? {
                return Ok(true);
            }
        }
        warn!(user_id, "debit lost every compare-and-swap attempt");
        Ok(false)
    }

    async fn try_credit(&self, user_id: i64, amount: u64) -> Result<bool> {
        for _ in 0..self.config.cas_attempts {
            match self.fetch(user_id).await? {
                None => {
                    if self.insert(user_id, amount).await? {
                        return Ok(true);
                    }
                    // Row appeared underneath us; fall through to CAS.
                }
                Some(seen) => {
                    let next = match seen.checked_add(amount) {
                        Some(next) => next,
                        None => return Ok(false),
                    };
                    if self.compare_and_swap(user_id, seen, next).await? {
                        return Ok(true);
                    }
                }
            }
        }
        warn!(user_id, "credit lost every compare-and-swap attempt");
        Ok(false)
    }
}

async fn rejected(response: reqwest::Response) -> LedgerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LedgerError::Rejected { status, body }
}

#[async_trait]
impl CreditLedger for SupabaseLedger {
    async fn balance(&self, user_id: i64) -> u64 {
        match self.try_balance(user_id).await {
            Ok(credits) => credits,
            Err(e) => {
                error!(user_id, error = %e, "balance read failed, reporting zero");
                0
            }
        }
    }

    async fn debit_one(&self, user_id: i64) -> bool {
        match self.try_debit_one(user_id).await {
            Ok(debited) => debited,
            Err(e) => {
                error!(user_id, error = %e, "debit failed, no credit deducted");
                false
            }
        }
    }

    async fn credit(&self, user_id: i64, amount: u64) -> bool {
        match self.try_credit(user_id, amount).await {
            Ok(credited) => credited,
            Err(e) => {
                error!(user_id, amount, error = %e, "credit failed");
                false
            }
        }
    }
}
