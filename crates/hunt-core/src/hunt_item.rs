//! Hunt items: admin-defined collectibles redeemed with a claim code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A hunt item players can claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Claim code; unique across items and immutable after creation.
    pub identifier: String,
    /// Points awarded on a successful claim. Never negative.
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HuntItem {
    /// Creates a new hunt item. The identifier is trimmed.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        identifier: impl Into<String>,
        points: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            identifier: identifier.into().trim().to_string(),
            points,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update in place and bumps `updated_at`.
    pub fn apply(&mut self, update: &HuntItemUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(points) = update.points {
            self.points = points;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update for a hunt item. The identifier cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub points: Option<i64>,
}

impl HuntItemUpdate {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.points.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_identifier() {
        let item = HuntItem::new("Fountain", "By the square", "  FOUNT-01 ", 50);
        assert_eq!(item.identifier, "FOUNT-01");
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut item = HuntItem::new("Fountain", "By the square", "FOUNT-01", 50);
        let original_identifier = item.identifier.clone();

        item.apply(&HuntItemUpdate {
            points: Some(75),
            ..Default::default()
        });

        assert_eq!(item.points, 75);
        assert_eq!(item.name, "Fountain");
        assert_eq!(item.identifier, original_identifier);
        assert!(item.updated_at >= item.created_at);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(HuntItemUpdate::default().is_empty());
        assert!(!HuntItemUpdate {
            name: Some("x".into()),
            ..Default::default()
        }
        .is_empty());
    }
}
