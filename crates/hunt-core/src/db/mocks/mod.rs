//! Mock implementations of repository traits for testing.
//!
//! These mocks use in-memory storage and do not require a database connection.
//! They back the service tests here and the route tests in `hunt-api`.

mod audit_repo;
mod hunt_item_repo;
mod user_repo;

pub use audit_repo::MockAuditRepository;
pub use hunt_item_repo::MockHuntItemRepository;
pub use user_repo::MockUserRepository;
