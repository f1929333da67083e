//! PostgreSQL storage implementation.
//!
//! Every unit of work runs in its own database transaction at `SERIALIZABLE`
//! isolation. PostgreSQL aborts one side of a dangerous concurrent interleaving
//! with SQLSTATE `40001` (or `40P01` for a deadlock); both are surfaced as
//! conflicts and the unit of work is retried.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};

use finapp_core::{
    Account, AccountBalance, AccountId, AccountStatus, AccountType, Amount, Customer, CustomerId,
    CustomerRole, HistoryEntry, NewAccount, NewHistoryEntry, RoleId,
};

use crate::config::PostgresConfig;
use crate::error::{Result, StoreError};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::schema::POSTGRES_SCHEMA;
use crate::{LedgerStore, TransactionHandle, UnitOfWork};

const BACKEND: &str = "postgres";

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

/// Advisory lock key held while the schema is created.
const SCHEMA_LOCK_KEY: i64 = 0x0f1a_ba11;

/// PostgreSQL-backed ledger store.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgLedgerStore {
    /// Connect to PostgreSQL as configured, creating the schema if requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot connect or the DDL fails.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Database(format!("failed to connect postgres: {e}")))?;

        let store = Self::from_pool(pool, config.retry.clone());
        if config.ensure_schema {
            store.ensure_schema().await?;
        }

        tracing::info!(
            max_connections = config.max_connections,
            "Connected PostgreSQL ledger store"
        );
        Ok(store)
    }

    /// Wrap an existing pool. The schema is left untouched.
    #[must_use]
    pub const fn from_pool(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// The retry policy this store applies.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Create the ledger tables if they do not exist yet.
    ///
    /// The DDL runs in one transaction under an advisory lock, so concurrent
    /// callers against an empty database apply it one at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for statement in POSTGRES_SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        tracing::debug!("PostgreSQL schema ensured");
        Ok(())
    }

    /// Run one attempt of a unit of work in a fresh `SERIALIZABLE` transaction.
    async fn attempt<T, F>(&self, work: &F) -> finapp_core::Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn TransactionHandle) -> UnitOfWork<'t, T> + Sync,
    {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let mut handle = PgTransaction { tx };
        match work(&mut handle).await {
            Ok(value) => {
                handle.tx.commit().await.map_err(map_sqlx_error)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(e) = handle.tx.rollback().await {
                    tracing::warn!(error = %e, "PostgreSQL rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
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

/// One attempt of a unit of work against PostgreSQL.
struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionHandle for PgTransaction {
    // =========================================================================
    // Account Operations
    // =========================================================================

    async fn read_balances(&mut self, account_ids: &[AccountId]) -> Result<Vec<AccountBalance>> {
        let ids: Vec<Vec<u8>> = account_ids.iter().map(AccountId::to_vec).collect();
        let rows = sqlx::query(
            "SELECT AccountId AS account_id, Balance AS balance FROM Account WHERE AccountId = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                Ok(AccountBalance {
                    account_id: decode_id(row, "account_id", AccountId::from_slice)?,
                    balance: decode_amount(row, "balance")?,
                })
            })
            .collect()
    }

    async fn get_account(&mut self, account_id: &AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r"
            SELECT AccountId AS account_id, AccountType AS account_type,
                   AccountStatus AS account_status, Balance AS balance,
                   CreationTimestamp AS creation_timestamp
            FROM Account WHERE AccountId = $1
            ",
        )
        .bind(account_id.to_vec())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn update_balance(&mut self, account_id: &AccountId, balance: Amount) -> Result<()> {
        let result = sqlx::query("UPDATE Account SET Balance = $1 WHERE AccountId = $2")
            .bind(balance.as_decimal())
            .bind(account_id.to_vec())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Database(format!(
                "account row missing: {account_id}"
            )));
        }
        Ok(())
    }

    async fn insert_account(&mut self, account: &NewAccount) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO Account (AccountId, AccountType, AccountStatus, Balance)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(account.account_id.to_vec())
        .bind(account.account_type.code())
        .bind(account.status.code())
        .bind(account.balance.as_decimal())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_insert_error(e, "account", || account.account_id.to_string()))?;
        Ok(())
    }

    // =========================================================================
    // Customer Operations
    // =========================================================================

    async fn insert_customer(&mut self, customer: &Customer) -> Result<()> {
        sqlx::query("INSERT INTO Customer (CustomerId, Name, Address) VALUES ($1, $2, $3)")
            .bind(customer.customer_id.to_vec())
            .bind(&customer.name)
            .bind(&customer.address)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_insert_error(e, "customer", || customer.customer_id.to_string()))?;
        Ok(())
    }

    async fn get_customer(&mut self, customer_id: &CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT CustomerId AS customer_id, Name AS name, Address AS address FROM Customer WHERE CustomerId = $1",
        )
        .bind(customer_id.to_vec())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| {
            Ok(Customer {
                customer_id: decode_id(&row, "customer_id", CustomerId::from_slice)?,
                name: row.try_get("name").map_err(decode_error)?,
                address: row.try_get("address").map_err(decode_error)?,
            })
        })
        .transpose()
    }

    async fn insert_customer_role(&mut self, role: &CustomerRole) -> Result<()> {
        sqlx::query(
            "INSERT INTO CustomerRole (CustomerId, AccountId, RoleId, Role) VALUES ($1, $2, $3, $4)",
        )
        .bind(role.customer_id.to_vec())
        .bind(role.account_id.to_vec())
        .bind(role.role_id.to_vec())
        .bind(&role.role_name)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            map_insert_error(e, "customer_role", || {
                format!("{}/{}", role.customer_id, role.role_id)
            })
        })?;
        Ok(())
    }

    async fn list_customer_roles(
        &mut self,
        customer_id: &CustomerId,
    ) -> Result<Vec<CustomerRole>> {
        let rows = sqlx::query(
            r"
            SELECT CustomerId AS customer_id, AccountId AS account_id,
                   RoleId AS role_id, Role AS role_name
            FROM CustomerRole WHERE CustomerId = $1
            ORDER BY RoleId
            ",
        )
        .bind(customer_id.to_vec())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                Ok(CustomerRole {
                    customer_id: decode_id(row, "customer_id", CustomerId::from_slice)?,
                    account_id: decode_id(row, "account_id", AccountId::from_slice)?,
                    role_id: decode_id(row, "role_id", RoleId::from_slice)?,
                    role_name: row.try_get("role_name").map_err(decode_error)?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Transaction History Operations
    // =========================================================================

    async fn insert_history(&mut self, entries: &[NewHistoryEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(entries.len());
        let mut amounts = Vec::with_capacity(entries.len());
        let mut credits = Vec::with_capacity(entries.len());
        for entry in entries {
            ids.push(entry.account_id.to_vec());
            amounts.push(entry.amount.as_decimal());
            credits.push(entry.is_credit);
        }

        sqlx::query(
            r"
            INSERT INTO TransactionHistory (AccountId, Amount, IsCredit)
            SELECT * FROM UNNEST($1::BYTEA[], $2::NUMERIC[], $3::BOOLEAN[])
            ",
        )
        .bind(ids)
        .bind(amounts)
        .bind(credits)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_history(&mut self, account_id: &AccountId) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r"
            SELECT AccountId AS account_id, Amount AS amount, IsCredit AS is_credit,
                   EventTimestamp AS event_timestamp
            FROM TransactionHistory WHERE AccountId = $1
            ORDER BY EventTimestamp, EntryId
            ",
        )
        .bind(account_id.to_vec())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                Ok(HistoryEntry {
                    account_id: decode_id(row, "account_id", AccountId::from_slice)?,
                    amount: decode_amount(row, "amount")?,
                    is_credit: row.try_get("is_credit").map_err(decode_error)?,
                    event_timestamp: row.try_get("event_timestamp").map_err(decode_error)?,
                })
            })
            .collect()
    }
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let type_code: i32 = row.try_get("account_type").map_err(decode_error)?;
    let status_code: i32 = row.try_get("account_status").map_err(decode_error)?;
    let creation_timestamp: DateTime<Utc> =
        row.try_get("creation_timestamp").map_err(decode_error)?;

    Ok(Account {
        account_id: decode_id(row, "account_id", AccountId::from_slice)?,
        account_type: AccountType::from_code(type_code).ok_or_else(|| {
            StoreError::Serialization(format!("unknown account type code {type_code}"))
        })?,
        status: AccountStatus::from_code(status_code).ok_or_else(|| {
            StoreError::Serialization(format!("unknown account status code {status_code}"))
        })?,
        balance: decode_amount(row, "balance")?,
        creation_timestamp,
    })
}

fn decode_id<I, E: std::fmt::Display>(
    row: &PgRow,
    column: &str,
    parse: impl FnOnce(&[u8]) -> std::result::Result<I, E>,
) -> Result<I> {
    let raw: Vec<u8> = row.try_get(column).map_err(decode_error)?;
    parse(&raw).map_err(|e| StoreError::Serialization(format!("{column}: {e}")))
}

fn decode_amount(row: &PgRow, column: &str) -> Result<Amount> {
    let value: Decimal = row.try_get(column).map_err(decode_error)?;
    Ok(Amount::from_decimal(value))
}

fn decode_error(e: sqlx::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

/// Classify a `sqlx` error. Serialization failures and deadlocks are transient.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                return StoreError::Conflict(db_err.message().to_string());
            }
            _ => {}
        }
    }
    StoreError::Database(err.to_string())
}

/// Like [`map_sqlx_error`], but a unique violation becomes a duplicate id.
fn map_insert_error(
    err: sqlx::Error,
    entity: &'static str,
    id: impl FnOnce() -> String,
) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate { entity, id: id() };
        }
    }
    map_sqlx_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_transient() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn insert_error_without_sqlstate_falls_through() {
        let err = map_insert_error(sqlx::Error::RowNotFound, "account", || "x".into());
        assert!(matches!(err, StoreError::Database(_)));
    }
}
