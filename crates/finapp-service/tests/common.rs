//! Common test utilities for finapp service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use finapp_service::{create_router, AppState, ServiceConfig};
use finapp_store::{AnyStore, RocksConfig, RocksLedgerStore};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksLedgerStore::open(&RocksConfig::new(temp_dir.path()))
            .expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            ..ServiceConfig::default()
        };

        let state = AppState::new(AnyStore::from(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
        }
    }

    /// Open a checking account with `balance` and return its id.
    pub async fn open_account(&self, balance: &str) -> String {
        let response = self
            .server
            .post("/v1/accounts")
            .json(&json!({
                "balance": balance,
                "account_type": "checking",
                "account_status": "active"
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["account_id"]
            .as_str()
            .expect("account_id in response")
            .to_string()
    }

    /// Register a customer and return its id.
    pub async fn create_customer(&self, name: &str) -> String {
        let response = self
            .server
            .post("/v1/customers")
            .json(&json!({ "name": name, "address": "1 Main St" }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["customer_id"]
            .as_str()
            .expect("customer_id in response")
            .to_string()
    }

    /// Current balance of an account as returned by the API.
    pub async fn balance(&self, account_id: &str) -> String {
        let response = self.server.get(&format!("/v1/accounts/{account_id}")).await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["balance"].as_str().expect("balance").to_string()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
