//! Runtime backend selection.

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::postgres::PgLedgerStore;
#[cfg(feature = "rocksdb-backend")]
use crate::rocks::RocksLedgerStore;
use crate::{LedgerStore, TransactionHandle, UnitOfWork};

/// Whichever backend the configuration selected.
#[derive(Clone)]
pub enum AnyStore {
    /// Embedded `RocksDB`.
    #[cfg(feature = "rocksdb-backend")]
    RocksDb(RocksLedgerStore),
    /// PostgreSQL.
    Postgres(PgLedgerStore),
}

impl AnyStore {
    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened or connected.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        tracing::debug!(backend = config.label(), "Opening ledger store");
        match config {
            #[cfg(feature = "rocksdb-backend")]
            StoreConfig::RocksDb(rocks) => RocksLedgerStore::open(rocks).map(Self::RocksDb),
            StoreConfig::Postgres(pg) => PgLedgerStore::connect(pg).await.map(Self::Postgres),
        }
    }
}

#[cfg(feature = "rocksdb-backend")]
impl From<RocksLedgerStore> for AnyStore {
    fn from(store: RocksLedgerStore) -> Self {
        Self::RocksDb(store)
    }
}

impl From<PgLedgerStore> for AnyStore {
    fn from(store: PgLedgerStore) -> Self {
        Self::Postgres(store)
    }
}

#[async_trait]
impl LedgerStore for AnyStore {
    fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "rocksdb-backend")]
            Self::RocksDb(store) => store.backend(),
            Self::Postgres(store) => store.backend(),
        }
    }

    async fn run_transaction<T, F>(&self, work: F) -> finapp_core::Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn TransactionHandle) -> UnitOfWork<'t, T> + Send + Sync,
    {
        match self {
            #[cfg(feature = "rocksdb-backend")]
            Self::RocksDb(store) => store.run_transaction(work).await,
            Self::Postgres(store) => store.run_transaction(work).await,
        }
    }
}
