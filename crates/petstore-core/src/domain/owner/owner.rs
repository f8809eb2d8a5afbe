//! Owner entity
//!
//! Owners are contact records. The pets they own are not stored on the
//! owner; they are the pets whose `owner_id` points back at it.

use crate::security::Credentials;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// A person who adopts pets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Store-assigned identifier
    pub id: i64,

    pub name: String,

    pub email: Option<String>,

    /// Login of the OWNER user linked to this record, if any
    pub login: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Owner {
    /// Apply contact changes
    pub fn apply(&mut self, update: &OwnerUpdate) {
        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = &update.email {
            self.email = email
                .as_ref()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty());
        }
        self.updated_at = Utc::now();
    }
}

/// Data for registering an owner
#[derive(Debug, Clone)]
pub struct NewOwner {
    pub name: String,
    pub email: Option<String>,
    /// When present, an OWNER user is created alongside the record
    pub credentials: Option<Credentials>,
}

impl NewOwner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            credentials: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// Changes to an existing owner
///
/// `email: Some(None)` clears the address. `password` only applies when the
/// owner has a linked user.
#[derive(Debug, Clone, Default)]
pub struct OwnerUpdate {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub password: Option<Zeroizing<String>>,
}

impl OwnerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }

    /// Whether any stored contact field changes
    pub fn touches_contact(&self) -> bool {
        self.name.is_some() || self.email.is_some()
    }
}
