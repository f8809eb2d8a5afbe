//! Adoption intents and records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open request by an owner to adopt a pet
///
/// At most one exists per pet, and only while the pet is PENDING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionIntent {
    pub pet_id: i64,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl AdoptionIntent {
    pub fn new(pet_id: i64, owner_id: i64) -> Self {
        Self {
            pet_id,
            owner_id,
            created_at: Utc::now(),
        }
    }

    /// Whether `owner_id` holds this intent
    pub fn is_held_by(&self, owner_id: i64) -> bool {
        self.owner_id == owner_id
    }
}

/// A completed adoption. Never modified once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionRecord {
    pub id: i64,
    pub pet_id: i64,
    pub owner_id: i64,
    pub adopted_at: DateTime<Utc>,
}
