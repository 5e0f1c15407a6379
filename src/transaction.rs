use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::iban::DEPOSIT_ORIGIN_IBAN;

/// A recorded movement of funds. Immutable once created, except for the
/// one-way `is_complete: false -> true` flip performed by settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Decimal,
    pub origin_iban: String,
    pub destination_iban: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_complete: bool,
}

impl Transaction {
    /// Creates a pending transaction with a fresh id.
    pub fn new(
        amount: Decimal,
        origin_iban: impl Into<String>,
        destination_iban: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            origin_iban: origin_iban.into(),
            destination_iban: destination_iban.into(),
            reason,
            created_at: Utc::now(),
            is_complete: false,
        }
    }

    /// Views the transaction from one of its two IBANs: outgoing when
    /// seen from the origin, incoming from the destination. The summary
    /// carries the other party's IBAN. Any other perspective is an
    /// invalid call.
    pub fn summarize(&self, perspective_iban: &str) -> Result<TransactionSummary, LedgerError> {
        let direction = if perspective_iban == self.origin_iban {
            TransactionDirection::Outgoing
        } else if perspective_iban == self.destination_iban {
            TransactionDirection::Incoming
        } else {
            return Err(LedgerError::MalformedInput(format!(
                "invalid perspective iban {perspective_iban}"
            )));
        };
        let counterparty = match direction {
            TransactionDirection::Outgoing => &self.destination_iban,
            TransactionDirection::Incoming => &self.origin_iban,
        };
        Ok(TransactionSummary {
            id: self.id,
            amount: self.amount,
            direction,
            iban: counterparty.clone(),
            reason: self.reason.clone(),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDirection {
    Incoming,
    Outgoing,
}

/// A transaction as seen from one account's point of view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub id: Uuid,
    pub amount: Decimal,
    pub direction: TransactionDirection,
    /// The other party's IBAN.
    pub iban: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A transfer request initiated from a customer account.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferInput {
    pub amount: Decimal,
    pub destination_iban: String,
    pub bic: Option<String>,
    pub reason: Option<String>,
}

/// A deposit request. The origin defaults to the fixed external
/// deposit-source IBAN.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositInput {
    pub amount: Decimal,
    #[serde(default = "deposit_origin")]
    pub origin_iban: String,
    pub destination_iban: String,
}

fn deposit_origin() -> String {
    DEPOSIT_ORIGIN_IBAN.to_owned()
}

impl DepositInput {
    pub fn new(amount: Decimal, destination_iban: impl Into<String>) -> Self {
        Self {
            amount,
            origin_iban: deposit_origin(),
            destination_iban: destination_iban.into(),
        }
    }
}
