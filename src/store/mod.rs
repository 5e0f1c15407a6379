//! Storage contracts for accounts and transactions, plus an "in memory"
//! implementation.
//!
//! These traits are the integration point for a durable backend; the
//! core only ever talks to them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::account::{Account, AccountFilter};
use crate::error::StoreError;
use crate::transaction::Transaction;

pub mod in_memory;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find(&self, filter: &AccountFilter) -> Vec<Account>;

    async fn find_by_iban(&self, iban: &str) -> Option<Account>;

    /// Persists a new account. Duplicate id or IBAN is a conflict.
    async fn save(&self, account: Account) -> Result<Account, StoreError>;

    /// Overwrites the balance of the account with the given IBAN.
    async fn update_balance(&self, iban: &str, new_balance: Decimal) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Option<Transaction>;

    /// Settled transactions touching the IBAN on either side, newest
    /// first.
    async fn find_settled_by_iban(&self, iban: &str) -> Vec<Transaction>;

    /// Persists a new pending transaction. Duplicate id is a conflict.
    async fn save(&self, transaction: Transaction) -> Result<Transaction, StoreError>;

    /// One-way flip to `is_complete = true`.
    async fn mark_complete(&self, id: Uuid) -> Result<(), StoreError>;
}
