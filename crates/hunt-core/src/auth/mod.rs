//! Authentication and authorization types for Hunt HQ.
//!
//! This module provides:
//! - User and Role definitions
//! - Session data structures
//! - Password hashing utilities

pub mod password;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User role for role-based access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages hunt items and inspects every player's claim activity.
    Admin,
    /// Claims hunt items and sees only their own history.
    #[default]
    Player,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Player => "player",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "player" => Ok(Role::Player),
            _ => Err(()),
        }
    }
}

/// A user account.
///
/// Claim attempts and history are loaded separately, see [`crate::UserProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Email address (unique, lower-cased).
    pub email: String,
    /// Display name.
    pub name: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role.
    pub role: Role,
    /// Whether the account is enabled.
    pub enabled: bool,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new enabled user. The email is normalized to lower case.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(&email.into()),
            name: name.into(),
            password_hash: password_hash.into(),
            role,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Normalizes an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Filter for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub email: Option<String>,
}

/// Session data stored for authenticated users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// User ID.
    pub user_id: Uuid,
    /// Email (for display and audit).
    pub email: String,
    /// User role at login time.
    pub role: Role,
}

impl SessionData {
    /// Creates session data for a freshly authenticated user.
    pub fn new(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}
