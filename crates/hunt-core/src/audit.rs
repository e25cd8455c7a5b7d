//! Audit trail for admin mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Admin actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// Claim attempts were cleared for a user.
    ClearClaimAttempts,
    /// A hunt item was created.
    CreateHuntItem,
    /// A hunt item was updated.
    UpdateHuntItem,
    /// A hunt item was deleted.
    DeleteHuntItem,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::ClearClaimAttempts => "clear_claim_attempts",
            AdminAction::CreateHuntItem => "create_hunt_item",
            AdminAction::UpdateHuntItem => "update_hunt_item",
            AdminAction::DeleteHuntItem => "delete_hunt_item",
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdminAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear_claim_attempts" => Ok(AdminAction::ClearClaimAttempts),
            "create_hunt_item" => Ok(AdminAction::CreateHuntItem),
            "update_hunt_item" => Ok(AdminAction::UpdateHuntItem),
            "delete_hunt_item" => Ok(AdminAction::DeleteHuntItem),
            _ => Err(()),
        }
    }
}

/// One entry in the admin audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAuditRecord {
    pub id: Uuid,
    pub action: AdminAction,
    /// Email of the admin who performed the action.
    pub actor: String,
    /// Email of the affected user, for user-scoped actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user: Option<String>,
    /// Id of the affected resource, for item-scoped actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl AdminAuditRecord {
    /// Creates a new record with no target or snapshots.
    pub fn new(action: AdminAction, actor: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            actor: actor.into(),
            target_user: None,
            resource_id: None,
            before: None,
            after: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_target_user(mut self, email: impl Into<String>) -> Self {
        self.target_user = Some(email.into());
        self
    }

    pub fn with_resource(mut self, id: Uuid) -> Self {
        self.resource_id = Some(id);
        self
    }

    /// Attaches before/after snapshots.
    pub fn with_change(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
