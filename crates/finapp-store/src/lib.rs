//! Transactional storage layer for the finapp ledger.
//!
//! This crate defines the contract every backend implements and ships two
//! interchangeable implementations:
//!
//! - [`RocksLedgerStore`]: embedded `RocksDB` using its native optimistic
//!   transactions (feature `rocksdb-backend`, on by default)
//! - [`PgLedgerStore`]: PostgreSQL through `sqlx` at `SERIALIZABLE` isolation
//!
//! [`AnyStore`] picks one of them from a [`StoreConfig`].
//!
//! # Units of work
//!
//! All access goes through [`LedgerStore::run_transaction`]. The closure it
//! receives is handed a [`TransactionHandle`] whose reads see the writes staged
//! earlier in the same unit of work. If the closure returns `Ok`, the adapter
//! commits; if it returns `Err`, everything staged is rolled back. When the
//! backend reports a conflicting concurrent transaction, the adapter re-runs
//! the closure from scratch under its [`RetryPolicy`], so the closure must not
//! carry state from one invocation to the next.
//!
//! # Example
//!
//! ```no_run
//! use finapp_core::{AccountId, LedgerError};
//! use finapp_store::{LedgerStore, RocksConfig, RocksLedgerStore};
//! use futures::FutureExt;
//!
//! # async fn demo() -> Result<(), LedgerError> {
//! let store = RocksLedgerStore::open(&RocksConfig::new("/tmp/finapp-db"))?;
//! let account_id = AccountId::generate();
//!
//! let account = store
//!     .run_transaction(move |tx| {
//!         async move { tx.get_account(&account_id).await.map_err(LedgerError::from) }.boxed()
//!     })
//!     .await?;
//! assert!(account.is_none());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod any;
pub mod config;
pub mod error;
pub mod keys;
pub mod postgres;
pub mod retry;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use any::AnyStore;
pub use config::{PostgresConfig, RocksConfig, StoreConfig};
pub use error::{Result, StoreError};
pub use postgres::PgLedgerStore;
pub use retry::RetryPolicy;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksLedgerStore;

use async_trait::async_trait;
use futures::future::BoxFuture;

use finapp_core::{
    Account, AccountBalance, AccountId, Amount, Customer, CustomerId, CustomerRole, HistoryEntry,
    NewAccount, NewHistoryEntry,
};

/// The future returned by one invocation of a unit of work.
pub type UnitOfWork<'t, T> = BoxFuture<'t, finapp_core::Result<T>>;

/// Transaction-scoped access to the ledger tables.
///
/// A handle belongs to exactly one attempt of one unit of work. Writes are
/// staged and become visible to other transactions only when the adapter
/// commits. Reads observe the writes already staged through the same handle.
#[async_trait]
pub trait TransactionHandle: Send {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Read the balances of the given accounts in one round trip.
    ///
    /// Missing accounts are simply absent from the result; an id listed twice
    /// produces one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or conflicts.
    async fn read_balances(&mut self, account_ids: &[AccountId]) -> Result<Vec<AccountBalance>>;

    /// Get a full account row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_account(&mut self, account_id: &AccountId) -> Result<Option<Account>>;

    /// Stage a new balance for an existing account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the account does not exist.
    async fn update_balance(&mut self, account_id: &AccountId, balance: Amount) -> Result<()>;

    /// Stage a new account; the store assigns its creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the account id is taken.
    async fn insert_account(&mut self, account: &NewAccount) -> Result<()>;

    // =========================================================================
    // Customer Operations
    // =========================================================================

    /// Stage a new customer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the customer id is taken.
    async fn insert_customer(&mut self, customer: &Customer) -> Result<()>;

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_customer(&mut self, customer_id: &CustomerId) -> Result<Option<Customer>>;

    /// Stage a new role binding. Referenced ids are not checked.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if `(customer_id, role_id)` is taken.
    async fn insert_customer_role(&mut self, role: &CustomerRole) -> Result<()>;

    /// List the role bindings of a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_customer_roles(&mut self, customer_id: &CustomerId)
        -> Result<Vec<CustomerRole>>;

    // =========================================================================
    // Transaction History Operations
    // =========================================================================

    /// Stage audit rows in one batch; the store assigns their timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_history(&mut self, entries: &[NewHistoryEntry]) -> Result<()>;

    /// List the audit rows of an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_history(&mut self, account_id: &AccountId) -> Result<Vec<HistoryEntry>>;
}

/// A transactional backend for the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Run `work` as one atomic, isolated unit of work.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`, and
    /// re-runs it after a backoff when the backend reports a transient
    /// conflict. The returned value is produced only after a successful commit.
    ///
    /// # Errors
    ///
    /// - Whatever non-transient error `work` returned.
    /// - `LedgerError::TransactionAborted` once retries or the deadline run out.
    async fn run_transaction<T, F>(&self, work: F) -> finapp_core::Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn TransactionHandle) -> UnitOfWork<'t, T> + Send + Sync;
}
