//! Services over the repositories.
//!
//! Services borrow repository trait objects so callers can build them per
//! request from a pool or hand in mocks under test.

mod claim_attempts;
mod redemption;

pub use crate::claim::UserClaimAttempt;
pub use claim_attempts::{
    AttemptCounts, ClaimAttemptQuery, ClaimAttemptReport, ClaimAttemptService, ClaimAttemptStats,
    ClearOutcome, DEFAULT_QUERY_LIMIT, MAX_QUERY_LIMIT,
};
pub use redemption::{ClaimOutcome, RedemptionService};
