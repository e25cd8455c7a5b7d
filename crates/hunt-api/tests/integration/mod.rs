//! Integration test modules.

pub mod auth_tests;
pub mod claim_attempt_tests;
pub mod common;
pub mod hunt_item_tests;
