//! Pure admission rules for transfers and deposits. Every check here
//! runs before any persistence, so a rejection never needs compensation.

use rust_decimal::Decimal;

use crate::account::{Account, AccountType};
use crate::error::{LedgerError, RejectReason};
use crate::iban::{is_valid_bic, is_valid_iban};
use crate::transaction::{DepositInput, TransferInput};

/// Input-only checks for a transfer from `src_iban`: self-transfer,
/// amount sign, and BIC-vs-origin match when a BIC is supplied.
pub fn check_transfer_input(src_iban: &str, input: &TransferInput) -> Result<(), LedgerError> {
    if src_iban == input.destination_iban {
        return Err(RejectReason::TransferToSelf.into());
    }
    if input.amount <= Decimal::ZERO {
        return Err(RejectReason::NonPositiveAmount.into());
    }
    if let Some(bic) = &input.bic {
        if !is_valid_bic(bic, src_iban) {
            return Err(RejectReason::WrongBic.into());
        }
    }
    Ok(())
}

/// Checks a transfer against the origin account snapshot: lock state,
/// IBAN shapes, and the per-account-type withdrawal rules.
pub fn check_transfer_against_account(
    account: &Account,
    input: &TransferInput,
) -> Result<(), LedgerError> {
    if account.is_locked {
        return Err(LedgerError::MalformedInput(format!(
            "account {} is locked",
            account.iban
        )));
    }
    if !is_valid_iban(&input.destination_iban) {
        return Err(LedgerError::MalformedInput(format!(
            "destination iban {} is invalid",
            input.destination_iban
        )));
    }
    if !is_valid_iban(&account.iban) {
        return Err(LedgerError::MalformedInput(format!(
            "source iban {} is invalid",
            account.iban
        )));
    }

    match account.kind {
        AccountType::Savings
            if account.ref_account_iban.as_deref() != Some(input.destination_iban.as_str()) =>
        {
            Err(RejectReason::WithdrawToNonReferenceAccount.into())
        }
        AccountType::PrivateLoan => Err(RejectReason::WithdrawFromPrivateLoan.into()),
        _ => Ok(()),
    }
}

/// Input-only checks for a deposit. Whether an internal destination
/// account actually exists is checked by the service, which owns the
/// store.
pub fn check_deposit_input(input: &DepositInput) -> Result<(), LedgerError> {
    if input.origin_iban == input.destination_iban {
        return Err(RejectReason::TransferToSelf.into());
    }
    if input.amount <= Decimal::ZERO {
        return Err(RejectReason::NonPositiveAmount.into());
    }
    if !is_valid_iban(&input.destination_iban) {
        return Err(LedgerError::MalformedInput(format!(
            "destination iban {} is invalid",
            input.destination_iban
        )));
    }
    Ok(())
}

/// Account-opening rule: a savings account must name its reference
/// account up front.
pub fn check_account_input(
    kind: AccountType,
    ref_account_iban: Option<&str>,
) -> Result<(), LedgerError> {
    if kind == AccountType::Savings && ref_account_iban.is_none() {
        return Err(RejectReason::MissingReferenceAccount.into());
    }
    Ok(())
}
