//! Account handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use finapp_core::{Account, AccountId, AccountStatus, AccountType, Amount, HistoryEntry};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Open account request.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Opening balance as a decimal string, e.g. `"100.50"`.
    pub balance: String,
    /// `checking` or `saving`.
    pub account_type: AccountType,
    /// `active` or `frozen`.
    pub account_status: AccountStatus,
}

/// Open account response.
#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    /// The generated account id.
    pub account_id: String,
}

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account id.
    pub account_id: String,
    /// Kind of account.
    pub account_type: AccountType,
    /// Lifecycle status.
    pub account_status: AccountStatus,
    /// Current balance as a decimal string.
    pub balance: String,
    /// Creation timestamp (RFC 3339).
    pub creation_timestamp: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id.to_string(),
            account_type: account.account_type,
            account_status: account.status,
            balance: account.balance.to_string(),
            creation_timestamp: account.creation_timestamp.to_rfc3339(),
        }
    }
}

/// One audit row.
#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    /// Account the movement applies to.
    pub account_id: String,
    /// Amount moved as a decimal string.
    pub amount: String,
    /// `true` for money arriving.
    pub is_credit: bool,
    /// Commit timestamp (RFC 3339).
    pub event_timestamp: String,
}

impl From<&HistoryEntry> for HistoryEntryResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            account_id: entry.account_id.to_string(),
            amount: entry.amount.to_string(),
            is_credit: entry.is_credit,
            event_timestamp: entry.event_timestamp.to_rfc3339(),
        }
    }
}

/// Account history response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Audit rows, oldest first.
    pub entries: Vec<HistoryEntryResponse>,
}

/// Open a new account under a freshly generated id.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<CreateAccountResponse>, ApiError> {
    let balance = Amount::parse(&body.balance)?;
    let account_id = AccountId::generate();

    state
        .ledger
        .create_account(account_id, body.account_type, body.account_status, balance)
        .await?;

    Ok(Json(CreateAccountResponse {
        account_id: account_id.to_string(),
    }))
}

/// Get an account by id.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account_id: AccountId = parse_id(&account_id)?;
    let account = state
        .ledger
        .get_account(account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("account not found: {account_id}")))?;

    Ok(Json(AccountResponse::from(&account)))
}

/// List the audit trail of an account.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let account_id: AccountId = parse_id(&account_id)?;
    let entries = state.ledger.transaction_history(account_id).await?;

    Ok(Json(HistoryResponse {
        entries: entries.iter().map(HistoryEntryResponse::from).collect(),
    }))
}
