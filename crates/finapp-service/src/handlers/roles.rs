//! Customer role handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use finapp_core::{AccountId, CustomerId, CustomerRole, RoleId};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Create role request. Neither id has to refer to an existing record.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    /// Customer receiving the role.
    pub customer_id: String,
    /// Account the role applies to.
    pub account_id: String,
    /// Role name, e.g. `owner`.
    pub role: String,
}

/// Create role response.
#[derive(Debug, Serialize)]
pub struct CreateRoleResponse {
    /// The generated role id.
    pub role_id: String,
}

/// One role binding.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    /// Customer holding the role.
    pub customer_id: String,
    /// Account the role applies to.
    pub account_id: String,
    /// Role id.
    pub role_id: String,
    /// Role name.
    pub role: String,
}

impl From<CustomerRole> for RoleResponse {
    fn from(role: CustomerRole) -> Self {
        Self {
            customer_id: role.customer_id.to_string(),
            account_id: role.account_id.to_string(),
            role_id: role.role_id.to_string(),
            role: role.role_name,
        }
    }
}

/// Roles of one customer.
#[derive(Debug, Serialize)]
pub struct RolesResponse {
    /// Role bindings.
    pub roles: Vec<RoleResponse>,
}

/// Bind a role on an account to a customer under a freshly generated id.
pub async fn create_customer_role(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<Json<CreateRoleResponse>, ApiError> {
    let customer_id: CustomerId = parse_id(&body.customer_id)?;
    let account_id: AccountId = parse_id(&body.account_id)?;
    let role_id = RoleId::generate();

    state
        .ledger
        .create_customer_role(customer_id, account_id, role_id, body.role)
        .await?;

    Ok(Json(CreateRoleResponse {
        role_id: role_id.to_string(),
    }))
}

/// List the roles held by a customer.
pub async fn list_customer_roles(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<Json<RolesResponse>, ApiError> {
    let customer_id: CustomerId = parse_id(&customer_id)?;
    let roles = state.ledger.customer_roles(customer_id).await?;

    Ok(Json(RolesResponse {
        roles: roles.into_iter().map(RoleResponse::from).collect(),
    }))
}
