//! Customer handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use finapp_core::{Customer, CustomerId};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Create customer request.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    /// Display name.
    pub name: String,
    /// Postal address.
    pub address: String,
}

/// Create customer response.
#[derive(Debug, Serialize)]
pub struct CreateCustomerResponse {
    /// The generated customer id.
    pub customer_id: String,
}

/// Customer response.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    /// Customer id.
    pub customer_id: String,
    /// Display name.
    pub name: String,
    /// Postal address.
    pub address: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            customer_id: customer.customer_id.to_string(),
            name: customer.name,
            address: customer.address,
        }
    }
}

/// Register a new customer under a freshly generated id.
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCustomerRequest>,
) -> Result<Json<CreateCustomerResponse>, ApiError> {
    let customer_id = CustomerId::generate();
    state
        .ledger
        .create_customer(customer_id, body.name, body.address)
        .await?;

    Ok(Json(CreateCustomerResponse {
        customer_id: customer_id.to_string(),
    }))
}

/// Get a customer by id.
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer_id: CustomerId = parse_id(&customer_id)?;
    let customer = state
        .ledger
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("customer not found: {customer_id}")))?;

    Ok(Json(customer.into()))
}
