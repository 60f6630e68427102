//! TinyAgents Ledger - Per-user credit balances
//!
//! The ledger is:
//! - Keyed by Telegram user id
//! - A single non-negative integer balance per user
//! - Created lazily (first read or first confirmed purchase)
//! - Fail-closed (ambiguous store state never grants credit)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. A debit is never applied when the observed balance is zero
//! 3. Every mutation is a conditional write, not a blind read-then-write
//!
//! Two implementations are provided: [`MemoryLedger`] for tests and local
//! runs, and [`SupabaseLedger`] against the PostgREST surface of a hosted
//! Postgres table.

pub mod memory;
pub mod supabase;

pub use memory::MemoryLedger;
pub use supabase::{SupabaseConfig, SupabaseLedger};

use async_trait::async_trait;
use thiserror::Error;

/// Credits granted per confirmed checkout.
pub const PURCHASE_GRANT: u64 = 100;

/// Errors that can occur in ledger operations
///
/// These stay internal to the ledger implementations: the [`CreditLedger`]
/// surface is fail-closed and converts every error into the deny outcome.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Store unreachable: {message}")]
    Unreachable { message: String },

    #[error("Store rejected request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed row: {message}")]
    MalformedRow { message: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The authoritative per-user balance store.
///
/// Callers gate paid work on these three operations and nothing else. All
/// of them absorb store failures: `balance` reports zero, the mutations
/// report `false`, and in no case does an error escape to the caller.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance for a user, creating the record at zero if absent.
    /// Returns 0 on any store error.
    async fn balance(&self, user_id: i64) -> u64;

    /// Deduct exactly one credit if the balance allows it.
    ///
    /// Returns `true` only when one credit was actually deducted. A zero
    /// balance, a missing record, a store error, or losing every
    /// compare-and-swap attempt all return `false` with no write applied.
    async fn debit_one(&self, user_id: i64) -> bool;

    /// Add `amount` credits, creating the record at `amount` if absent.
    /// Returns `false` on any store error.
    async fn credit(&self, user_id: i64, amount: u64) -> bool;
}
