//! User model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// User status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            other => Err(Error::InvalidArgument(format!("unknown user status: {}", other))),
        }
    }
}

/// User model
///
/// `password` always holds a PHC-formatted hash, never the raw credential.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID, immutable once assigned
    pub id: Uuid,
    /// Unique login name
    pub username: String,
    /// Salted one-way password hash
    #[serde(skip_serializing)]
    pub password: String,
    /// Lifecycle status
    pub status: UserStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user with a fresh identifier
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = super::timestamp_now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password: password_hash.into(),
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

// Keeps the hash out of logs
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}
