//! API handlers.

use std::str::FromStr;

use finapp_core::{IdError, LedgerError};

use crate::error::ApiError;

pub mod accounts;
pub mod customers;
pub mod health;
pub mod roles;
pub mod transfers;

/// Parse an identifier from a path segment or request field.
fn parse_id<I>(raw: &str) -> Result<I, ApiError>
where
    I: FromStr<Err = IdError>,
{
    raw.parse()
        .map_err(|e: IdError| ApiError::from(LedgerError::from(e)))
}
