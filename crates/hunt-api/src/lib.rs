//! # hunt-api
//!
//! REST API server for Hunt HQ.
//!
//! This crate provides:
//! - Hunt item management for admins
//! - Claim-attempt monitoring and rate-limit resets
//! - Claim redemption with the shared failed-claim rate limit
//! - Session authentication with admin role checks
//! - Health, metrics and OpenAPI endpoints

pub mod auth;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::ApiError;
pub use server::{ApiDoc, ApiServer, ApiServerConfig};
pub use state::AppState;
