//! Producer-side orchestration: validates requests, records pending
//! transactions, and hands them off to settlement.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::account::{Account, AccountFilter, AccountInput};
use crate::error::LedgerError;
use crate::iban::is_internal_iban;
use crate::messaging::{SettlementPublisher, SettlementRequest};
use crate::store::{AccountStore, TransactionStore};
use crate::transaction::{DepositInput, Transaction, TransactionSummary, TransferInput};
use crate::validate;

pub struct LedgerService {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
    publisher: Arc<dyn SettlementPublisher>,
}

impl LedgerService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        publisher: Arc<dyn SettlementPublisher>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            publisher,
        }
    }

    pub async fn account_balance(&self, iban: &str) -> Option<Decimal> {
        self.accounts.find_by_iban(iban).await.map(|a| a.balance)
    }

    pub async fn accounts_by_filter(&self, filter: &AccountFilter) -> Vec<Account> {
        self.accounts.find(filter).await
    }

    /// Opens a new account with a generated IBAN. Savings accounts must
    /// name their reference account.
    pub async fn open_account(&self, input: AccountInput) -> Result<Account, LedgerError> {
        validate::check_account_input(input.kind, input.ref_account_iban.as_deref())?;
        Ok(self.accounts.save(input.into_account()).await?)
    }

    pub async fn transaction_by_id(&self, id: Uuid) -> Option<Transaction> {
        self.transactions.find_by_id(id).await
    }

    /// Settled transactions touching the IBAN, newest first, each seen
    /// from that IBAN's perspective.
    pub async fn transaction_history(
        &self,
        iban: &str,
    ) -> Result<Vec<TransactionSummary>, LedgerError> {
        self.transactions
            .find_settled_by_iban(iban)
            .await
            .iter()
            .map(|t| t.summarize(iban))
            .collect()
    }

    /// Admits a transfer from `src_iban`, records it pending, then
    /// publishes the settlement request. Rejections happen before any
    /// persistence; the publish happens only after the save succeeded.
    pub async fn create_transfer(
        &self,
        src_iban: &str,
        input: TransferInput,
    ) -> Result<Transaction, LedgerError> {
        validate::check_transfer_input(src_iban, &input)?;
        let account = self.accounts.find_by_iban(src_iban).await.ok_or_else(|| {
            LedgerError::NotFound(format!("no customer account found for iban {src_iban}"))
        })?;
        validate::check_transfer_against_account(&account, &input)?;

        let transaction = Transaction::new(
            input.amount,
            account.iban,
            input.destination_iban,
            input.reason,
        );
        self.record_and_publish(transaction).await
    }

    /// Admits a deposit. Internal destinations must have a local
    /// account; external ones are tracked elsewhere and skip the check.
    pub async fn create_deposit(&self, input: DepositInput) -> Result<Transaction, LedgerError> {
        validate::check_deposit_input(&input)?;
        if is_internal_iban(&input.destination_iban)
            && self
                .accounts
                .find_by_iban(&input.destination_iban)
                .await
                .is_none()
        {
            return Err(LedgerError::NotFound(format!(
                "no account found for iban {}",
                input.destination_iban
            )));
        }

        let transaction = Transaction::new(
            input.amount,
            input.origin_iban,
            input.destination_iban,
            Some("deposit".to_owned()),
        );
        self.record_and_publish(transaction).await
    }

    async fn record_and_publish(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, LedgerError> {
        let saved = self.transactions.save(transaction).await?;
        // not atomic with the save: a publish failure leaves the
        // transaction stuck pending, it never corrupts balances
        if let Err(err) = self
            .publisher
            .publish(SettlementRequest {
                transaction_id: saved.id,
            })
            .await
        {
            tracing::warn!(transaction_id = %saved.id, %err, "settlement request not published, transaction stays pending");
        }
        Ok(saved)
    }
}
