//! Applies a pending transaction's balance effect and flips it to
//! complete.
//!
//! Balance updates for overlapping accounts must not interleave, so the
//! engine serializes the whole read-balances/write-balances section per
//! account. Locks are per IBAN and taken in sorted order, which lets
//! disjoint transactions settle concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use uuid::Uuid;

use crate::account::Account;
use crate::error::LedgerError;
use crate::iban::{DEPOSIT_ORIGIN_IBAN, is_internal_iban};
use crate::store::{AccountStore, TransactionStore};
use crate::transaction::Transaction;

/// Per-IBAN mutual exclusion for settlement critical sections.
#[derive(Default)]
pub struct LockManager {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockManager {
    fn handle(&self, iban: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(iban.to_owned())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Locks both IBANs for the duration of the returned guards,
    /// acquiring in sorted order so overlapping settlements never
    /// deadlock.
    async fn lock_pair(&self, a: &str, b: &str) -> Vec<tokio::sync::OwnedMutexGuard<()>> {
        let mut ibans = [a, b];
        ibans.sort_unstable();
        // origin != destination is a transaction invariant, but a
        // duplicate here must not self-deadlock
        if ibans[0] == ibans[1] {
            vec![self.handle(ibans[0]).lock_owned().await]
        } else {
            vec![
                self.handle(ibans[0]).lock_owned().await,
                self.handle(ibans[1]).lock_owned().await,
            ]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Balances updated and the transaction marked complete.
    Settled,
    /// The transaction was already complete; nothing was changed.
    AlreadyComplete,
    /// No transaction with that id exists; treated as a no-op.
    UnknownTransaction,
}

pub struct SettlementEngine {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
    locks: LockManager,
}

impl SettlementEngine {
    pub fn new(accounts: Arc<dyn AccountStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            accounts,
            transactions,
            locks: LockManager::default(),
        }
    }

    /// Settles one transaction by id. Idempotent: redelivered ids are a
    /// no-op once the transaction is complete. On a missing required
    /// account nothing is written and the transaction stays pending.
    pub async fn settle(&self, transaction_id: Uuid) -> Result<SettlementOutcome, LedgerError> {
        info!(%transaction_id, "trying to settle transaction");
        let Some(transaction) = self.transactions.find_by_id(transaction_id).await else {
            warn!(%transaction_id, "transaction not found, skipping");
            return Ok(SettlementOutcome::UnknownTransaction);
        };

        let _guards = self
            .locks
            .lock_pair(&transaction.origin_iban, &transaction.destination_iban)
            .await;

        // re-read under the locks: a concurrent delivery of the same id
        // may have completed it while we waited
        let Some(transaction) = self.transactions.find_by_id(transaction_id).await else {
            return Ok(SettlementOutcome::UnknownTransaction);
        };
        if transaction.is_complete {
            info!(%transaction_id, "transaction already settled, skipping");
            return Ok(SettlementOutcome::AlreadyComplete);
        }

        self.apply_balance_effects(&transaction).await?;
        self.transactions.mark_complete(transaction_id).await?;
        info!(%transaction_id, "transaction successfully settled");
        Ok(SettlementOutcome::Settled)
    }

    /// Reads every required account before the first write, so a
    /// missing account aborts with zero balance mutations.
    async fn apply_balance_effects(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        let origin = self.required_account(&transaction.origin_iban).await?;
        let destination = self.required_account(&transaction.destination_iban).await?;

        if let Some(account) = origin {
            let new_balance = account.balance - transaction.amount;
            self.accounts
                .update_balance(&account.iban, new_balance)
                .await?;
        }
        if let Some(account) = destination {
            let new_balance = account.balance + transaction.amount;
            self.accounts
                .update_balance(&account.iban, new_balance)
                .await?;
        }
        Ok(())
    }

    /// An account participates in settlement when its IBAN is internal
    /// and not the deposit source. Participating accounts must exist.
    async fn required_account(&self, iban: &str) -> Result<Option<Account>, LedgerError> {
        if iban == DEPOSIT_ORIGIN_IBAN || !is_internal_iban(iban) {
            return Ok(None);
        }
        match self.accounts.find_by_iban(iban).await {
            Some(account) => Ok(Some(account)),
            None => {
                warn!(%iban, "account not found, settlement aborted");
                Err(LedgerError::NotFound(format!(
                    "account for iban {iban} not found"
                )))
            }
        }
    }
}
