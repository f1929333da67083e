//! Core types and utilities for the finapp ledger.
//!
//! This crate provides the foundational types shared by the store adapters,
//! the transfer engine and the HTTP service:
//!
//! - **Identifiers**: `CustomerId`, `AccountId`, `RoleId` (opaque 16 bytes)
//! - **Money**: `Amount`, an exact decimal parsed from a narrow wire format
//! - **Records**: `Customer`, `Account`, `CustomerRole`, `HistoryEntry`
//! - **Errors**: `LedgerError`, the taxonomy every backend maps into
//!
//! # Balances
//!
//! Balances are exact decimals and are never negative. The invariant is
//! checked when an account is opened and again inside every transfer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod amount;
pub mod error;
pub mod ids;
pub mod model;

pub use amount::Amount;
pub use error::{LedgerError, Result};
pub use ids::{AccountId, CustomerId, IdError, RoleId, ID_LEN};
pub use model::{
    Account, AccountBalance, AccountStatus, AccountType, Customer, CustomerRole, HistoryEntry,
    NewAccount, NewHistoryEntry, TransferOutcome,
};
