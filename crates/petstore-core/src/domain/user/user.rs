//! User accounts able to authenticate against the store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role granted to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store administrator
    Admin,
    /// Registered owner, acting on its own behalf
    Owner,
}

impl Role {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,

    /// Uppercase hex digest of the password
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,

    /// Linked owner record; set exactly for OWNER users
    pub owner_id: Option<i64>,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn admin(login: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password_hash: password_hash.into(),
            role: Role::Admin,
            owner_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn owner(login: impl Into<String>, password_hash: impl Into<String>, owner_id: i64) -> Self {
        Self {
            login: login.into(),
            password_hash: password_hash.into(),
            role: Role::Owner,
            owner_id: Some(owner_id),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("login", &self.login)
            .field("role", &self.role)
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}
