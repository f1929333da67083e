//! Error types for the ledger.

use crate::amount::Amount;
use crate::ids::{AccountId, IdError};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
///
/// Every backend maps its native failures into this enum, so callers cannot
/// tell which store served a request.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A request argument failed validation before reaching the store.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A decimal string did not match the amount wire format.
    #[error("invalid amount format: {0:?}")]
    InvalidAmountFormat(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// A referenced account does not exist.
    #[error("account not found: {account_id}")]
    AccountNotFound {
        /// The account that was not found.
        account_id: AccountId,
    },

    /// The source account cannot cover the transfer.
    #[error("insufficient funds in account {account_id}: balance={balance}, amount={amount}")]
    InsufficientFunds {
        /// The source account.
        account_id: AccountId,
        /// Balance read inside the transaction.
        balance: Amount,
        /// Amount requested.
        amount: Amount,
    },

    /// A primary key already exists.
    #[error("duplicate {entity} id: {id}")]
    DuplicateId {
        /// The kind of record (`customer`, `account`, `customer_role`).
        entity: &'static str,
        /// The duplicated identifier.
        id: String,
    },

    /// The store detected a conflicting concurrent transaction.
    ///
    /// Transient: store adapters retry the unit of work and never surface
    /// this variant once their retry loop is done.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The unit of work exhausted its retry budget or deadline.
    #[error("transaction aborted after {attempts} attempt(s): {reason}")]
    TransactionAborted {
        /// Number of attempts made.
        attempts: u32,
        /// The last transient failure observed.
        reason: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Whether the whole unit of work may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
