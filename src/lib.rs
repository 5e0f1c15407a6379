/// Structural IBAN/BIC classification: well-formed, internal, external.
/// Pure functions, no dependencies on the rest of the crate.
pub mod iban;

/// Account entity, its types, and the account-opening input.
pub mod account;

/// Transaction entity, per-IBAN summaries, and transfer/deposit inputs.
pub mod transaction;

/// Error taxonomy: typed rejection codes, not-found, storage conflicts.
pub mod error;

/// Pure admission rules applied before anything is persisted.
pub mod validate;

/// Storage contracts plus an "in memory" implementation.
///
/// NOTE: The traits are the integration point for a durable backend;
/// everything above only talks to them.
pub mod store;

/// Settlement-request hand-off between producer and consumer.
pub mod messaging;

/// Applies transaction effects to balances under per-account locking.
pub mod settlement;

/// Producer-side orchestration: validate, record pending, publish.
pub mod service;
