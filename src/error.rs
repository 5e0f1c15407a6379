use thiserror::Error;

/// Typed rejection codes produced by transfer/deposit validation.
/// These are business-rule rejections, decided before any persistence,
/// and are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Transfer to self is not allowed")]
    TransferToSelf,
    #[error("Transfer amount must be positive")]
    NonPositiveAmount,
    #[error("BIC does not match the origin IBAN")]
    WrongBic,
    #[error("A reference account must be provided for savings account")]
    MissingReferenceAccount,
    #[error("withdrawal not possible from private loan account")]
    WithdrawFromPrivateLoan,
    #[error("from savings account, you can only transfer to the reference account")]
    WithdrawToNonReferenceAccount,
}

/// Failures surfaced by the account and transaction stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity already exists: {0}")]
    AlreadyExists(String),
    #[error("update failed: {0}")]
    UpdateFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A validation rule rejected the request; carries the reason code.
    #[error(transparent)]
    Rejected(#[from] RejectReason),
    /// Malformed input outside the reason-code set: bad IBAN shape,
    /// locked account, invalid summary perspective.
    #[error("invalid input: {0}")]
    MalformedInput(String),
    /// A referenced account or transaction is absent. Distinct from
    /// invalid input; may be transient at settlement time.
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}
