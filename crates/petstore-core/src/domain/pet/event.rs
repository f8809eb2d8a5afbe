//! Pet event types for the audit trail
//!
//! Every state-changing pet operation appends one event in the same
//! transaction as the change itself.

use super::pet::PetStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of pet event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetEventType {
    /// Pet entered the store
    Registered,
    /// Attributes changed
    Updated,
    /// An owner started an adoption
    AdoptionInitiated,
    /// Adoption completed
    AdoptionFinalized,
    /// Open adoption withdrawn
    AdoptionCancelled,
    /// Pet removed from the store
    Removed,
}

impl PetEventType {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "registered" => Some(Self::Registered),
            "updated" => Some(Self::Updated),
            "adoption_initiated" => Some(Self::AdoptionInitiated),
            "adoption_finalized" => Some(Self::AdoptionFinalized),
            "adoption_cancelled" => Some(Self::AdoptionCancelled),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Updated => "updated",
            Self::AdoptionInitiated => "adoption_initiated",
            Self::AdoptionFinalized => "adoption_finalized",
            Self::AdoptionCancelled => "adoption_cancelled",
            Self::Removed => "removed",
        }
    }
}

impl std::fmt::Display for PetEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded change to a pet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetEvent {
    /// Unique event identifier
    pub id: Uuid,

    /// Pet this event belongs to
    pub pet_id: i64,

    /// Type of event
    pub event_type: PetEventType,

    /// Login of the user who caused the event
    pub actor: String,

    /// Event data (JSON)
    pub data: Option<serde_json::Value>,

    /// When the event occurred
    pub created_at: DateTime<Utc>,
}

impl PetEvent {
    /// Create a new pet event
    pub fn new(
        pet_id: i64,
        event_type: PetEventType,
        actor: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pet_id,
            event_type,
            actor: actor.into(),
            data,
            created_at: Utc::now(),
        }
    }

    pub fn registered(pet_id: i64, actor: &str, name: &str) -> Self {
        let data = serde_json::json!({ "name": name });
        Self::new(pet_id, PetEventType::Registered, actor, Some(data))
    }

    pub fn updated(pet_id: i64, actor: &str, fields: &[&str]) -> Self {
        let data = serde_json::json!({ "fields": fields });
        Self::new(pet_id, PetEventType::Updated, actor, Some(data))
    }

    pub fn adoption_initiated(pet_id: i64, actor: &str, owner_id: i64) -> Self {
        let data = serde_json::json!({ "owner_id": owner_id });
        Self::new(pet_id, PetEventType::AdoptionInitiated, actor, Some(data))
    }

    pub fn adoption_finalized(pet_id: i64, actor: &str, owner_id: i64, record_id: i64) -> Self {
        let data = serde_json::json!({
            "owner_id": owner_id,
            "record_id": record_id,
        });
        Self::new(pet_id, PetEventType::AdoptionFinalized, actor, Some(data))
    }

    pub fn adoption_cancelled(pet_id: i64, actor: &str, owner_id: i64) -> Self {
        let data = serde_json::json!({ "owner_id": owner_id });
        Self::new(pet_id, PetEventType::AdoptionCancelled, actor, Some(data))
    }

    /// Create a removed event, noting the status the pet left
    pub fn removed(pet_id: i64, actor: &str, previous: PetStatus) -> Self {
        let data = serde_json::json!({ "previous_status": previous.as_str() });
        Self::new(pet_id, PetEventType::Removed, actor, Some(data))
    }
}
