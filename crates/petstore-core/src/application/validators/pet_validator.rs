//! Pet input validation

use crate::application::errors::{AppResult, ApplicationError};
use crate::domain::pet::{NewPet, PetUpdate};
use chrono::{NaiveDate, Utc};

const MAX_NAME_LENGTH: usize = 100;
const MAX_BREED_LENGTH: usize = 100;

/// Validator for pet operations
pub struct PetValidator;

impl PetValidator {
    /// Validate a pet name
    ///
    /// Rules:
    /// - Must not be blank
    /// - Must be 100 characters or less
    pub fn validate_name(name: &str) -> AppResult<()> {
        let name = name.trim();

        if name.is_empty() {
            return Err(ApplicationError::validation("name", "Pet name cannot be empty"));
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ApplicationError::validation(
                "name",
                "Pet name must be 100 characters or less",
            ));
        }

        Ok(())
    }

    /// Validate a breed; blank is allowed
    pub fn validate_breed(breed: &str) -> AppResult<()> {
        if breed.trim().chars().count() > MAX_BREED_LENGTH {
            return Err(ApplicationError::validation(
                "breed",
                "Breed must be 100 characters or less",
            ));
        }

        Ok(())
    }

    /// Validate a birth date against `today`
    pub fn validate_birth(birth: NaiveDate, today: NaiveDate) -> AppResult<()> {
        if birth > today {
            return Err(ApplicationError::validation(
                "birth",
                format!("Birth date {} is in the future", birth),
            ));
        }

        Ok(())
    }

    /// Validate everything needed to register a pet
    pub fn validate_new_pet(new_pet: &NewPet) -> AppResult<()> {
        Self::validate_name(&new_pet.name)?;
        if let Some(breed) = &new_pet.breed {
            Self::validate_breed(breed)?;
        }
        Self::validate_birth(new_pet.birth, Utc::now().date_naive())
    }

    /// Validate a pet update
    pub fn validate_update(update: &PetUpdate) -> AppResult<()> {
        if update.is_empty() {
            return Err(ApplicationError::validation("update", "Nothing to update"));
        }
        if let Some(name) = &update.name {
            Self::validate_name(name)?;
        }
        if let Some(Some(breed)) = &update.breed {
            Self::validate_breed(breed)?;
        }
        if let Some(birth) = update.birth {
            Self::validate_birth(birth, Utc::now().date_naive())?;
        }
        Ok(())
    }
}
