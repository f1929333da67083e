//! Application state.

use std::sync::Arc;

use finapp_ledger::Ledger;
use finapp_store::{AnyStore, LedgerStore};

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger engine over the configured backend.
    pub ledger: Arc<Ledger<AnyStore>>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: AnyStore, config: ServiceConfig) -> Self {
        tracing::info!(backend = store.backend(), "Ledger ready");
        Self {
            ledger: Arc::new(Ledger::new(store)),
            config,
        }
    }

    /// Name of the storage backend in use.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.ledger.store().backend()
    }
}
