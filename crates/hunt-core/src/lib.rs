//! # hunt-core
//!
//! Core data models and persistence for Hunt HQ.
//!
//! This crate provides the hunt item and claim attempt models, the shared
//! rate-limit evaluation used for both enforcement and display, the clear
//! policies admins apply to a user's attempts, and the repository layer.

pub mod audit;
pub mod auth;
pub mod claim;
pub mod db;
pub mod error;
pub mod hunt_item;
pub mod rate_limit;
pub mod services;

pub use audit::{AdminAction, AdminAuditRecord};
pub use claim::{
    ClaimAttempt, ClaimAttemptFilter, ClearPolicy, HistoryEntry, UnknownClearPolicy, UserProfile,
};
pub use error::ServiceError;
pub use hunt_item::{HuntItem, HuntItemUpdate};
pub use rate_limit::{RateLimitPolicy, RateLimitStatus};
pub use services::{
    AttemptCounts, ClaimAttemptQuery, ClaimAttemptReport, ClaimAttemptService, ClaimAttemptStats,
    ClaimOutcome, ClearOutcome, RedemptionService, UserClaimAttempt,
};

// Auth exports
pub use auth::password::{hash_password, verify_password, PasswordError};
pub use auth::{Role, SessionData, User, UserFilter};
