//! Account and customer integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn create_account_and_read_back() {
    let harness = TestHarness::new();
    let account_id = harness.open_account("250.75").await;

    let response = harness
        .server
        .get(&format!("/v1/accounts/{account_id}"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["account_id"], account_id.as_str());
    assert_eq!(body["balance"], "250.75");
    assert_eq!(body["account_type"], "checking");
    assert_eq!(body["account_status"], "active");
    assert!(body["creation_timestamp"].is_string());
}

#[tokio::test]
async fn create_account_with_negative_balance_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .json(&json!({
            "balance": "-5",
            "account_type": "saving",
            "account_status": "active"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn create_account_with_malformed_balance_fails() {
    let harness = TestHarness::new();

    for balance in ["", ".", "1e5", "12,50", "abc", "1.2.3"] {
        let response = harness
            .server
            .post("/v1/accounts")
            .json(&json!({
                "balance": balance,
                "account_type": "checking",
                "account_status": "frozen"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn get_unknown_account_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/accounts/00000000-0000-0000-0000-000000000001")
        .await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn get_account_with_bad_id_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/accounts/not-an-id").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn new_account_has_empty_history() {
    let harness = TestHarness::new();
    let account_id = harness.open_account("1").await;

    let response = harness
        .server
        .get(&format!("/v1/accounts/{account_id}/history"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["entries"], json!([]));
}

// ============================================================================
// Customers and roles
// ============================================================================

#[tokio::test]
async fn create_customer_and_read_back() {
    let harness = TestHarness::new();
    let customer_id = harness.create_customer("Ada").await;

    let response = harness
        .server
        .get(&format!("/v1/customers/{customer_id}"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["address"], "1 Main St");
}

#[tokio::test]
async fn customer_roles_are_listed() {
    let harness = TestHarness::new();
    let customer_id = harness.create_customer("Ada").await;
    let account_id = harness.open_account("10").await;

    for role in ["owner", "viewer"] {
        let response = harness
            .server
            .post("/v1/customer-roles")
            .json(&json!({
                "customer_id": customer_id,
                "account_id": account_id,
                "role": role
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert!(body["role_id"].is_string());
    }

    let response = harness
        .server
        .get(&format!("/v1/customers/{customer_id}/roles"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let roles = body["roles"].as_array().unwrap();
    assert_eq!(roles.len(), 2);
    assert!(roles.iter().all(|r| r["account_id"] == account_id.as_str()));
}

#[tokio::test]
async fn role_for_unknown_ids_is_accepted() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/customer-roles")
        .json(&json!({
            "customer_id": "00000000-0000-0000-0000-00000000000a",
            "account_id": "00000000-0000-0000-0000-00000000000b",
            "role": "owner"
        }))
        .await;

    response.assert_status_ok();
}
