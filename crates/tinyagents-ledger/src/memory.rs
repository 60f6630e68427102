//! In-process ledger backed by a `RwLock`ed map
//!
//! Used by the test suites and by local runs without a persistence service.
//! The whole check-and-mutate sequence for a debit or credit happens under
//! one write lock, so concurrent callers cannot observe the same balance
//! and both win.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::CreditLedger;

/// In-memory credit ledger
#[derive(Clone, Default)]
pub struct MemoryLedger {
    accounts: Arc<RwLock<HashMap<i64, u64>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a balance directly. Test convenience.
    pub async fn set_balance(&self, user_id: i64, credits: u64) {
        self.accounts.write().await.insert(user_id, credits);
    }
}

#[async_trait]
impl CreditLedger for MemoryLedger {
    async fn balance(&self, user_id: i64) -> u64 {
        let mut accounts = self.accounts.write().await;
        *accounts.entry(user_id).or_insert(0)
    }

    async fn debit_one(&self, user_id: i64) -> bool {
        let mut accounts = self.accounts.write().await;
        let balance = accounts.entry(user_id).or_insert(0);
        if *balance > 0 {
            *balance -= 1;
            true
        } else {
            false
        }
    }

    async fn credit(&self, user_id: i64, amount: u64) -> bool {
        let mut accounts = self.accounts.write().await;
        let balance = accounts.entry(user_id).or_insert(0);
        match balance.checked_add(amount) {
            Some(next) => {
                *balance = next;
                true
            }
            None => false,
        }
    }
}
