//! finapp HTTP API service.
//!
//! This crate exposes the ledger over JSON:
//!
//! - Customers and customer roles
//! - Accounts and their audit trail
//! - Balance transfers
//!
//! Amounts travel as decimal strings and identifiers as hyphenated UUID
//! strings. Every error is returned as `{"error": {"code", "message"}}`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Axum handlers all return Result
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
