//! `RocksDB` storage implementation.
//!
//! This module provides `RocksLedgerStore`, built on `RocksDB`'s optimistic
//! transactions. Every key a unit of work reads in order to write is tracked
//! with `get_for_update`; if another transaction commits a change to any of
//! those keys first, the commit fails with `Busy` and the unit of work is
//! retried.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, ErrorKind, IteratorMode,
    OptimisticTransactionDB, Options, Transaction,
};

use async_trait::async_trait;
use finapp_core::{
    Account, AccountBalance, AccountId, Amount, Customer, CustomerId, CustomerRole, HistoryEntry,
    NewAccount, NewHistoryEntry,
};

use crate::config::RocksConfig;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::schema::{all_column_families, cf};
use crate::{LedgerStore, TransactionHandle, UnitOfWork};

const BACKEND: &str = "rocksdb";

/// RocksDB-backed ledger store.
#[derive(Clone)]
pub struct RocksLedgerStore {
    db: Arc<OptimisticTransactionDB>,
    retry: RetryPolicy,
}

impl RocksLedgerStore {
    /// Open or create a `RocksDB` database as configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open(config: &RocksConfig) -> Result<Self> {
        let store = Self::open_path(&config.path, config.retry.clone())?;
        tracing::info!(path = %config.path.display(), "Opened RocksDB ledger store");
        Ok(store)
    }

    fn open_path<P: AsRef<Path>>(path: P, retry: RetryPolicy) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = OptimisticTransactionDB::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            retry,
        })
    }

    /// The retry policy this store applies.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run one attempt of a unit of work in a fresh transaction.
    async fn attempt<T, F>(&self, work: &F) -> finapp_core::Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn TransactionHandle) -> UnitOfWork<'t, T> + Sync,
    {
        let mut handle = RocksTransaction {
            db: &self.db,
            txn: self.db.transaction(),
            timestamp: Utc::now(),
        };

        match work(&mut handle).await {
            Ok(value) => {
                handle.commit()?;
                Ok(value)
            }
            Err(err) => {
                handle.rollback();
                Err(err)
            }
        }
    }
}

#[async_trait]
impl LedgerStore for RocksLedgerStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn run_transaction<T, F>(&self, work: F) -> finapp_core::Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn TransactionHandle) -> UnitOfWork<'t, T> + Send + Sync,
    {
        let work = &work;
        run_with_retry(&self.retry, BACKEND, move || self.attempt(work)).await
    }
}

/// One attempt of a unit of work against `RocksDB`.
struct RocksTransaction<'db> {
    db: &'db OptimisticTransactionDB,
    txn: Transaction<'db, OptimisticTransactionDB>,
    /// Assigned to every row this attempt creates.
    timestamp: DateTime<Utc>,
}

impl RocksTransaction<'_> {
    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Read a key and register it for conflict detection at commit.
    fn get_tracked(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.txn
            .get_for_update_cf(cf, key, true)
            .map_err(map_rocks_error)
    }

    /// Read a key without tracking it.
    fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.txn.get_cf(cf, key).map_err(map_rocks_error)
    }

    fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.txn.put_cf(cf, key, value).map_err(map_rocks_error)
    }

    /// Insert a value, failing if the key already exists.
    fn insert_new<V: serde::Serialize>(
        &self,
        cf_name: &str,
        key: &[u8],
        value: &V,
        entity: &'static str,
        id: impl FnOnce() -> String,
    ) -> Result<()> {
        if self.get_tracked(cf_name, key)?.is_some() {
            return Err(StoreError::Duplicate { entity, id: id() });
        }
        self.put(cf_name, key, &serialize(value)?)
    }

    /// Decode every value whose key starts with `prefix`, in key order.
    fn scan_prefix<V: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<V>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .txn
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut values = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(map_rocks_error)?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(deserialize(&value)?);
        }
        Ok(values)
    }

    fn load_account(&self, account_id: &AccountId, tracked: bool) -> Result<Option<Account>> {
        let key = keys::account_key(account_id);
        let raw = if tracked {
            self.get_tracked(cf::ACCOUNTS, &key)?
        } else {
            self.get(cf::ACCOUNTS, &key)?
        };
        raw.map(|data| deserialize(&data)).transpose()
    }

    fn commit(self) -> Result<()> {
        self.txn.commit().map_err(map_rocks_error)
    }

    fn rollback(self) {
        if let Err(e) = self.txn.rollback() {
            tracing::warn!(error = %e, "RocksDB rollback failed");
        }
    }
}

#[async_trait]
impl TransactionHandle for RocksTransaction<'_> {
    // =========================================================================
    // Account Operations
    // =========================================================================

    async fn read_balances(&mut self, account_ids: &[AccountId]) -> Result<Vec<AccountBalance>> {
        let mut balances: Vec<AccountBalance> = Vec::with_capacity(account_ids.len());
        for account_id in account_ids {
            if balances.iter().any(|b| b.account_id == *account_id) {
                continue;
            }
            if let Some(account) = self.load_account(account_id, true)? {
                balances.push(AccountBalance {
                    account_id: account.account_id,
                    balance: account.balance,
                });
            }
        }
        Ok(balances)
    }

    async fn get_account(&mut self, account_id: &AccountId) -> Result<Option<Account>> {
        self.load_account(account_id, false)
    }

    async fn update_balance(&mut self, account_id: &AccountId, balance: Amount) -> Result<()> {
        let mut account = self
            .load_account(account_id, true)?
            .ok_or_else(|| StoreError::Database(format!("account row missing: {account_id}")))?;

        account.balance = balance;
        self.put(
            cf::ACCOUNTS,
            &keys::account_key(account_id),
            &serialize(&account)?,
        )
    }

    async fn insert_account(&mut self, account: &NewAccount) -> Result<()> {
        let row = account.clone().into_account(self.timestamp);
        self.insert_new(
            cf::ACCOUNTS,
            &keys::account_key(&account.account_id),
            &row,
            "account",
            || account.account_id.to_string(),
        )
    }

    // =========================================================================
    // Customer Operations
    // =========================================================================

    async fn insert_customer(&mut self, customer: &Customer) -> Result<()> {
        self.insert_new(
            cf::CUSTOMERS,
            &keys::customer_key(&customer.customer_id),
            customer,
            "customer",
            || customer.customer_id.to_string(),
        )
    }

    async fn get_customer(&mut self, customer_id: &CustomerId) -> Result<Option<Customer>> {
        self.get(cf::CUSTOMERS, &keys::customer_key(customer_id))?
            .map(|data| deserialize(&data))
            .transpose()
    }

    async fn insert_customer_role(&mut self, role: &CustomerRole) -> Result<()> {
        self.insert_new(
            cf::CUSTOMER_ROLES,
            &keys::customer_role_key(&role.customer_id, &role.role_id),
            role,
            "customer_role",
            || format!("{}/{}", role.customer_id, role.role_id),
        )
    }

    async fn list_customer_roles(
        &mut self,
        customer_id: &CustomerId,
    ) -> Result<Vec<CustomerRole>> {
        self.scan_prefix(cf::CUSTOMER_ROLES, &keys::customer_roles_prefix(customer_id))
    }

    // =========================================================================
    // Transaction History Operations
    // =========================================================================

    async fn insert_history(&mut self, entries: &[NewHistoryEntry]) -> Result<()> {
        for entry in entries {
            let nonce = uuid::Uuid::new_v4();
            let key = keys::history_key(&entry.account_id, self.timestamp, nonce.as_bytes());
            let row = entry.stamped(self.timestamp);
            self.put(cf::TRANSACTION_HISTORY, &key, &serialize(&row)?)?;
        }
        Ok(())
    }

    async fn list_history(&mut self, account_id: &AccountId) -> Result<Vec<HistoryEntry>> {
        self.scan_prefix(cf::TRANSACTION_HISTORY, &keys::history_prefix(account_id))
    }
}

/// Classify a `RocksDB` error. Write conflicts are transient.
fn map_rocks_error(e: rocksdb::Error) -> StoreError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TryAgain => StoreError::Conflict(e.to_string()),
        _ => StoreError::Database(e.to_string()),
    }
}

/// Serialize a value using CBOR.
fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value from CBOR.
fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
}
