use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::iban::generate_iban;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    PrivateLoan,
}

/// A customer account. Mutated only by the settlement engine's balance
/// update, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub holder_id: Uuid,
    pub iban: String,
    /// Only meaningful for savings accounts: the sole IBAN a savings
    /// account may transfer to. Non-null at creation for savings.
    pub ref_account_iban: Option<String>,
    pub kind: AccountType,
    pub balance: Decimal,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing a holder's accounts. An empty `account_types`
/// matches every type.
#[derive(Debug, Clone)]
pub struct AccountFilter {
    pub holder_id: Uuid,
    pub account_types: Vec<AccountType>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        account.holder_id == self.holder_id
            && (self.account_types.is_empty() || self.account_types.contains(&account.kind))
    }
}

/// Account-opening request. The IBAN is generated, not caller-supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInput {
    pub holder_id: Uuid,
    pub ref_account_iban: Option<String>,
    pub kind: AccountType,
    #[serde(default)]
    pub is_locked: bool,
}

impl AccountInput {
    pub fn into_account(self) -> Account {
        Account {
            id: Uuid::new_v4(),
            holder_id: self.holder_id,
            iban: generate_iban(),
            ref_account_iban: self.ref_account_iban,
            kind: self.kind,
            balance: Decimal::ZERO,
            is_locked: self.is_locked,
            created_at: Utc::now(),
        }
    }
}
