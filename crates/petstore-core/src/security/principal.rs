//! The caller on whose behalf a service operation runs

use crate::domain::user::{Role, User};
use serde::Serialize;
use std::fmt;

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub login: String,
    pub role: Role,
    /// Owner record the caller acts as, for OWNER users
    pub owner_id: Option<i64>,
}

/// Caller identity passed to every service operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    /// No credentials were presented
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Principal {
    pub fn admin(login: impl Into<String>) -> Self {
        Self::Authenticated(Identity {
            login: login.into(),
            role: Role::Admin,
            owner_id: None,
        })
    }

    pub fn owner(login: impl Into<String>, owner_id: i64) -> Self {
        Self::Authenticated(Identity {
            login: login.into(),
            role: Role::Owner,
            owner_id: Some(owner_id),
        })
    }

    /// Principal for a stored user
    pub fn from_user(user: &User) -> Self {
        Self::Authenticated(Identity {
            login: user.login.clone(),
            role: user.role,
            owner_id: user.owner_id,
        })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(identity) => Some(identity),
        }
    }

    /// Login used in logs and audit entries
    pub fn login(&self) -> &str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated(identity) => &identity.login,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|i| i.role)
    }

    pub fn owner_id(&self) -> Option<i64> {
        self.identity().and_then(|i| i.owner_id)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated(identity) => write!(f, "{} ({})", identity.login, identity.role),
        }
    }
}
