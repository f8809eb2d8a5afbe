//! Pet entity and its lifecycle
//!
//! Defines the Pet type, its species and the status machine every pet
//! follows while it is in the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Bird,
    Cat,
    Dog,
    Rabbit,
    Other,
}

impl Species {
    /// All known species, in display order
    pub const ALL: [Species; 5] = [
        Self::Bird,
        Self::Cat,
        Self::Dog,
        Self::Rabbit,
        Self::Other,
    ];

    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bird" => Some(Self::Bird),
            "cat" => Some(Self::Cat),
            "dog" => Some(Self::Dog),
            "rabbit" => Some(Self::Rabbit),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bird => "bird",
            Self::Cat => "cat",
            Self::Dog => "dog",
            Self::Rabbit => "rabbit",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a pet
///
/// ```text
/// AVAILABLE --initiate--> PENDING --finalize--> ADOPTED
///     ^                      |
///     +-------cancel---------+
///
/// AVAILABLE | ADOPTED --remove--> REMOVED (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetStatus {
    /// In the store, free to be adopted
    Available,
    /// An owner has an open adoption intent
    Pending,
    /// Adoption finalized; bound to its owner
    Adopted,
    /// Administratively removed
    Removed,
}

impl PetStatus {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "available" => Some(Self::Available),
            "pending" => Some(Self::Pending),
            "adopted" => Some(Self::Adopted),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Adopted => "adopted",
            Self::Removed => "removed",
        }
    }

    /// Whether `next` is a permitted edge from this status
    pub fn can_transition_to(&self, next: PetStatus) -> bool {
        use PetStatus::*;
        matches!(
            (self, next),
            (Available, Pending)
                | (Pending, Adopted)
                | (Pending, Available)
                | (Available, Removed)
                | (Adopted, Removed)
        )
    }

    /// Whether no transition leaves this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

impl Default for PetStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pet cannot move from '{from}' to '{to}'")]
pub struct InvalidTransition {
    pub from: PetStatus,
    pub to: PetStatus,
}

/// A pet held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    /// Store-assigned identifier
    pub id: i64,

    pub name: String,

    pub species: Species,

    pub breed: Option<String>,

    /// Date of birth (never in the future)
    pub birth: NaiveDate,

    /// Current lifecycle status
    pub status: PetStatus,

    /// Owner the pet is bound to once adopted
    pub owner_id: Option<i64>,

    /// Optimistic lock counter, bumped on every write
    pub version: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Pet {
    fn transition(&mut self, next: PetStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// AVAILABLE -> PENDING
    pub fn reserve(&mut self) -> Result<(), InvalidTransition> {
        self.transition(PetStatus::Pending)
    }

    /// PENDING -> ADOPTED, binding the pet to `owner_id`
    pub fn adopt(&mut self, owner_id: i64) -> Result<(), InvalidTransition> {
        self.transition(PetStatus::Adopted)?;
        self.owner_id = Some(owner_id);
        Ok(())
    }

    /// PENDING -> AVAILABLE
    pub fn release(&mut self) -> Result<(), InvalidTransition> {
        self.transition(PetStatus::Available)
    }

    /// Any non-pending status -> REMOVED, unbinding the owner
    pub fn retire(&mut self) -> Result<(), InvalidTransition> {
        self.transition(PetStatus::Removed)?;
        self.owner_id = None;
        Ok(())
    }

    /// Apply attribute changes; status and owner are untouched
    pub fn apply(&mut self, update: &PetUpdate) {
        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(species) = update.species {
            self.species = species;
        }
        if let Some(breed) = &update.breed {
            self.breed = breed
                .as_ref()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty());
        }
        if let Some(birth) = update.birth {
            self.birth = birth;
        }
        self.updated_at = Utc::now();
    }

    /// Whether the pet is bound to `owner_id`
    pub fn is_owned_by(&self, owner_id: i64) -> bool {
        self.owner_id == Some(owner_id)
    }

    /// Age in whole years on `today`
    pub fn age_in_years(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birth).unwrap_or(0)
    }
}

/// Data for registering a pet in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub species: Species,
    pub breed: Option<String>,
    pub birth: NaiveDate,
}

impl NewPet {
    pub fn new(name: impl Into<String>, species: Species, birth: NaiveDate) -> Self {
        Self {
            name: name.into(),
            species,
            breed: None,
            birth,
        }
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }
}

/// Attribute changes for an existing pet
///
/// `breed: Some(None)` clears the breed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PetUpdate {
    pub name: Option<String>,
    pub species: Option<Species>,
    pub breed: Option<Option<String>>,
    pub birth: Option<NaiveDate>,
}

impl PetUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.species.is_none() && self.breed.is_none() && self.birth.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(status: PetStatus) -> Pet {
        let now = Utc::now();
        Pet {
            id: 1,
            name: "Rex".to_string(),
            species: Species::Dog,
            breed: None,
            birth: NaiveDate::from_ymd_opt(2020, 5, 17).unwrap(),
            status,
            owner_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_species_from_str() {
        assert_eq!(Species::from_str("dog"), Some(Species::Dog));
        assert_eq!(Species::from_str("CAT"), Some(Species::Cat));
        assert_eq!(Species::from_str(" Bird "), Some(Species::Bird));
        assert_eq!(Species::from_str("dragon"), None);
        for species in Species::ALL {
            assert_eq!(Species::from_str(species.as_str()), Some(species));
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(PetStatus::from_str("available"), Some(PetStatus::Available));
        assert_eq!(PetStatus::from_str("PENDING"), Some(PetStatus::Pending));
        assert_eq!(PetStatus::from_str("Adopted"), Some(PetStatus::Adopted));
        assert_eq!(PetStatus::from_str("removed"), Some(PetStatus::Removed));
        assert_eq!(PetStatus::from_str("sold"), None);
    }

    #[test]
    fn test_status_edges() {
        use PetStatus::*;
        let all = [Available, Pending, Adopted, Removed];
        let allowed = [
            (Available, Pending),
            (Pending, Adopted),
            (Pending, Available),
            (Available, Removed),
            (Adopted, Removed),
        ];

        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_removed_is_terminal() {
        assert!(PetStatus::Removed.is_terminal());
        assert!(!PetStatus::Adopted.is_terminal());
        assert_eq!(PetStatus::default(), PetStatus::Available);
    }

    #[test]
    fn test_adoption_lifecycle() {
        let mut pet = pet(PetStatus::Available);

        pet.reserve().unwrap();
        assert_eq!(pet.status, PetStatus::Pending);
        assert_eq!(pet.owner_id, None);

        pet.adopt(7).unwrap();
        assert_eq!(pet.status, PetStatus::Adopted);
        assert!(pet.is_owned_by(7));

        let err = pet.adopt(7).unwrap_err();
        assert_eq!(err.from, PetStatus::Adopted);
        assert_eq!(err.to, PetStatus::Adopted);
    }

    #[test]
    fn test_release_only_from_pending() {
        let mut pet = pet(PetStatus::Available);
        assert!(pet.release().is_err());

        pet.reserve().unwrap();
        pet.release().unwrap();
        assert_eq!(pet.status, PetStatus::Available);
    }

    #[test]
    fn test_retire_rejected_while_pending() {
        let mut pending = pet(PetStatus::Pending);
        assert!(pending.retire().is_err());
        assert_eq!(pending.status, PetStatus::Pending);

        let mut adopted = pet(PetStatus::Adopted);
        adopted.owner_id = Some(3);
        adopted.retire().unwrap();
        assert_eq!(adopted.status, PetStatus::Removed);
        assert_eq!(adopted.owner_id, None);

        assert!(adopted.reserve().is_err());
    }

    #[test]
    fn test_apply_update_keeps_status() {
        let mut pet = pet(PetStatus::Pending);
        pet.apply(&PetUpdate {
            name: Some("  Ein ".to_string()),
            species: Some(Species::Bird),
            breed: Some(Some("Corgi".to_string())),
            birth: None,
        });

        assert_eq!(pet.name, "Ein");
        assert_eq!(pet.species, Species::Bird);
        assert_eq!(pet.breed.as_deref(), Some("Corgi"));
        assert_eq!(pet.status, PetStatus::Pending);

        pet.apply(&PetUpdate {
            breed: Some(None),
            ..Default::default()
        });
        assert_eq!(pet.breed, None);
    }

    #[test]
    fn test_age_in_years() {
        let pet = pet(PetStatus::Available);
        assert_eq!(pet.age_in_years(NaiveDate::from_ymd_opt(2023, 5, 16).unwrap()), 2);
        assert_eq!(pet.age_in_years(NaiveDate::from_ymd_opt(2023, 5, 17).unwrap()), 3);
    }

    #[test]
    fn test_empty_update() {
        assert!(PetUpdate::default().is_empty());
        assert!(!PetUpdate {
            name: Some("x".into()),
            ..Default::default()
        }
        .is_empty());
    }
}
