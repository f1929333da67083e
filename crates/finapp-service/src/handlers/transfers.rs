//! Balance transfer handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use finapp_core::{AccountId, Amount};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Transfer request.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Account to debit.
    pub from_account_id: String,
    /// Account to credit.
    pub to_account_id: String,
    /// Amount as a decimal string, e.g. `"12.50"`.
    pub amount: String,
}

/// Transfer response.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Committed balance of each account touched, keyed by account id.
    pub balances: BTreeMap<String, String>,
}

/// Move money between two accounts.
pub async fn move_account_balance(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let from: AccountId = parse_id(&body.from_account_id)?;
    let to: AccountId = parse_id(&body.to_account_id)?;
    let amount = Amount::parse(&body.amount)?;

    let outcome = state.ledger.move_account_balance(from, to, amount).await?;

    let balances = outcome
        .balances()
        .into_iter()
        .map(|(account_id, balance)| (account_id.to_string(), balance.to_string()))
        .collect();

    Ok(Json(TransferResponse { balances }))
}
