//! Database schema definitions.
//!
//! The RocksDB backend stores each table in its own column family; the
//! PostgreSQL backend uses the relational tables below. Both describe the same
//! four tables: `Customer`, `Account`, `CustomerRole`, `TransactionHistory`.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Customer records, keyed by `customer_id`.
    pub const CUSTOMERS: &str = "customers";

    /// Account records, keyed by `account_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Role bindings, keyed by `customer_id || role_id`.
    pub const CUSTOMER_ROLES: &str = "customer_roles";

    /// Audit rows, keyed by `account_id || timestamp || entry nonce`.
    pub const TRANSACTION_HISTORY: &str = "transaction_history";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::CUSTOMERS,
        cf::ACCOUNTS,
        cf::CUSTOMER_ROLES,
        cf::TRANSACTION_HISTORY,
    ]
}

/// PostgreSQL DDL, applied in order by `PgLedgerStore::ensure_schema`.
///
/// Every statement is idempotent. Timestamp columns default to `now()`, the
/// transaction timestamp, so the database rather than the caller assigns them.
pub const POSTGRES_SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS Customer (
        CustomerId BYTEA PRIMARY KEY,
        Name       TEXT NOT NULL,
        Address    TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS Account (
        AccountId         BYTEA PRIMARY KEY,
        AccountType       INTEGER NOT NULL,
        AccountStatus     INTEGER NOT NULL,
        Balance           NUMERIC NOT NULL CHECK (Balance >= 0),
        CreationTimestamp TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS CustomerRole (
        CustomerId BYTEA NOT NULL,
        AccountId  BYTEA NOT NULL,
        RoleId     BYTEA NOT NULL,
        Role       TEXT NOT NULL,
        PRIMARY KEY (CustomerId, RoleId)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS TransactionHistory (
        EntryId        BIGSERIAL PRIMARY KEY,
        AccountId      BYTEA NOT NULL,
        Amount         NUMERIC NOT NULL CHECK (Amount >= 0),
        IsCredit       BOOLEAN NOT NULL,
        EventTimestamp TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS TransactionHistoryByAccount
        ON TransactionHistory (AccountId, EventTimestamp)
    ",
];
