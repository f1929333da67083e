//! Ledger records.
//!
//! Records come in two shapes: the values a caller supplies when creating a
//! row (`NewAccount`, `NewHistoryEntry`) and the persisted rows returned by
//! reads, which additionally carry the timestamp the store assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::ids::{AccountId, CustomerId, RoleId};

// ============================================================================
// Customers
// ============================================================================

/// A customer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Caller-chosen identifier.
    pub customer_id: CustomerId,
    /// Display name.
    pub name: String,
    /// Postal address.
    pub address: String,
}

/// A named capability linking a customer to an account (e.g. `owner`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRole {
    /// The customer holding the role.
    pub customer_id: CustomerId,
    /// The account the role applies to.
    pub account_id: AccountId,
    /// Identifier of this role binding.
    pub role_id: RoleId,
    /// Role label.
    pub role_name: String,
}

// ============================================================================
// Accounts
// ============================================================================

/// Kind of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Checking account.
    Checking,
    /// Savings account.
    Saving,
}

impl AccountType {
    /// Stored integer code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Checking => 1,
            Self::Saving => 2,
        }
    }

    /// Decode a stored integer code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Checking),
            2 => Some(Self::Saving),
            _ => None,
        }
    }
}

/// Operational status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account is open.
    Active,
    /// Account is frozen.
    Frozen,
}

impl AccountStatus {
    /// Stored integer code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Active => 1,
            Self::Frozen => 2,
        }
    }

    /// Decode a stored integer code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Active),
            2 => Some(Self::Frozen),
            _ => None,
        }
    }
}

/// Values supplied when opening an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Caller-chosen identifier.
    pub account_id: AccountId,
    /// Kind of account.
    pub account_type: AccountType,
    /// Initial status.
    pub status: AccountStatus,
    /// Opening balance. Never negative.
    pub balance: Amount,
}

impl NewAccount {
    /// Attach the store-assigned creation timestamp.
    #[must_use]
    pub fn into_account(self, creation_timestamp: DateTime<Utc>) -> Account {
        Account {
            account_id: self.account_id,
            account_type: self.account_type,
            status: self.status,
            balance: self.balance,
            creation_timestamp,
        }
    }
}

/// A persisted account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Identifier.
    pub account_id: AccountId,
    /// Kind of account.
    pub account_type: AccountType,
    /// Current status.
    pub status: AccountStatus,
    /// Current balance. Never negative.
    pub balance: Amount,
    /// When the creating transaction committed (store assigned).
    pub creation_timestamp: DateTime<Utc>,
}

/// The balance column of an account, as returned by the transfer read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    /// Identifier.
    pub account_id: AccountId,
    /// Current balance.
    pub balance: Amount,
}

// ============================================================================
// Transaction history
// ============================================================================

/// An audit row staged by a transfer; the store fills in the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewHistoryEntry {
    /// Account the movement applies to.
    pub account_id: AccountId,
    /// Amount moved. Never negative.
    pub amount: Amount,
    /// `true` for money arriving, `false` for money leaving.
    pub is_credit: bool,
}

impl NewHistoryEntry {
    /// Money leaving `account_id`.
    #[must_use]
    pub const fn debit(account_id: AccountId, amount: Amount) -> Self {
        Self {
            account_id,
            amount,
            is_credit: false,
        }
    }

    /// Money arriving at `account_id`.
    #[must_use]
    pub const fn credit(account_id: AccountId, amount: Amount) -> Self {
        Self {
            account_id,
            amount,
            is_credit: true,
        }
    }

    /// Attach the store-assigned event timestamp.
    #[must_use]
    pub fn stamped(self, event_timestamp: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            account_id: self.account_id,
            amount: self.amount,
            is_credit: self.is_credit,
            event_timestamp,
        }
    }
}

/// An immutable audit row in the transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Account the movement applies to.
    pub account_id: AccountId,
    /// Amount moved.
    pub amount: Amount,
    /// `true` for money arriving, `false` for money leaving.
    pub is_credit: bool,
    /// When the transfer committed (store assigned).
    pub event_timestamp: DateTime<Utc>,
}

// ============================================================================
// Transfers
// ============================================================================

/// Committed balances after a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    /// Source account.
    pub from_account_id: AccountId,
    /// Source balance after commit.
    pub from_balance: Amount,
    /// Destination account.
    pub to_account_id: AccountId,
    /// Destination balance after commit.
    pub to_balance: Amount,
}

impl TransferOutcome {
    /// Balances keyed by account. A self transfer yields a single entry.
    #[must_use]
    pub fn balances(&self) -> Vec<(AccountId, Amount)> {
        if self.from_account_id == self.to_account_id {
            vec![(self.to_account_id, self.to_balance)]
        } else {
            vec![
                (self.from_account_id, self.from_balance),
                (self.to_account_id, self.to_balance),
            ]
        }
    }
}
