use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::account::{Account, AccountFilter};
use crate::error::StoreError;
use crate::transaction::Transaction;

use super::{AccountStore, TransactionStore};

/// Accounts keyed by IBAN. The mutex is never held across an await.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find(&self, filter: &AccountFilter) -> Vec<Account> {
        let mut matching: Vec<Account> = self
            .lock()
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.created_at);
        matching
    }

    async fn find_by_iban(&self, iban: &str) -> Option<Account> {
        self.lock().get(iban).cloned()
    }

    async fn save(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.lock();
        if accounts.contains_key(&account.iban) || accounts.values().any(|a| a.id == account.id) {
            return Err(StoreError::AlreadyExists(format!(
                "account {} already exists",
                account.id
            )));
        }
        accounts.insert(account.iban.clone(), account.clone());
        Ok(account)
    }

    async fn update_balance(&self, iban: &str, new_balance: Decimal) -> Result<(), StoreError> {
        let mut accounts = self.lock();
        let account = accounts.get_mut(iban).ok_or_else(|| {
            StoreError::UpdateFailed(format!("account with iban={iban} cannot be updated"))
        })?;
        account.balance = new_balance;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTransactionStore {
    transactions: Mutex<HashMap<Uuid, Transaction>>,
}

impl InMemoryTransactionStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Transaction>> {
        self.transactions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn find_by_id(&self, id: Uuid) -> Option<Transaction> {
        self.lock().get(&id).cloned()
    }

    async fn find_settled_by_iban(&self, iban: &str) -> Vec<Transaction> {
        let mut settled: Vec<Transaction> = self
            .lock()
            .values()
            .filter(|t| t.is_complete && (t.origin_iban == iban || t.destination_iban == iban))
            .cloned()
            .collect();
        settled.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        settled
    }

    async fn save(&self, transaction: Transaction) -> Result<Transaction, StoreError> {
        let mut transactions = self.lock();
        if transactions.contains_key(&transaction.id) {
            return Err(StoreError::AlreadyExists(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn mark_complete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut transactions = self.lock();
        let transaction = transactions.get_mut(&id).ok_or_else(|| {
            StoreError::UpdateFailed(format!("transaction with id={id} cannot be updated"))
        })?;
        transaction.is_complete = true;
        Ok(())
    }
}
