//! Pet service
//!
//! Registration, reads, attribute updates and administrative removal of
//! pets. Adoption transitions live in the adoption service.

use super::ServiceContext;
use super::retry::with_conflict_retry;
use crate::application::errors::{AppResult, ApplicationError};
use crate::application::validators::PetValidator;
use crate::domain::adoption::AdoptionRepository;
use crate::domain::owner::OwnerRepository;
use crate::domain::pet::{NewPet, Pet, PetEvent, PetRepository, PetStatus, PetUpdate};
use crate::domain::user::Role;
use crate::security::{Operation, Principal, Target};
use serde::Serialize;
use tracing::{debug, info};

/// Authorization target for a loaded pet
pub(crate) fn pet_target(pet: &Pet) -> Target {
    Target::Pet {
        pet_id: pet.id,
        status: pet.status,
        owner_id: pet.owner_id,
    }
}

/// Head counts across the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StoreSummary {
    pub owners: i64,
    pub available: i64,
    pub pending: i64,
    pub adopted: i64,
    pub removed: i64,
}

/// Service for pet operations
#[derive(Debug, Clone)]
pub struct PetService {
    ctx: ServiceContext,
}

impl PetService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a pet; it starts AVAILABLE
    pub async fn register_pet(&self, principal: &Principal, new_pet: NewPet) -> AppResult<Pet> {
        PetValidator::validate_new_pet(&new_pet)?;

        let new_pet = NewPet {
            name: new_pet.name.trim().to_string(),
            breed: new_pet
                .breed
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            ..new_pet
        };

        with_conflict_retry(Operation::RegisterPet, self.ctx.retries(), || {
            self.try_register_pet(principal, &new_pet)
        })
        .await
    }

    async fn try_register_pet(&self, principal: &Principal, new_pet: &NewPet) -> AppResult<Pet> {
        let mut uow = self.ctx.db().begin("register_pet").await?;
        self.ctx
            .authorize(principal, Operation::RegisterPet, Target::Store)
            .await?;

        let pet = PetRepository::insert(uow.conn(), new_pet).await?;
        PetRepository::save_event(uow.conn(), &PetEvent::registered(pet.id, principal.login(), &pet.name))
            .await?;
        uow.commit().await?;

        info!(
            pet_id = pet.id,
            species = %pet.species,
            actor = %principal.login(),
            "Pet registered"
        );
        Ok(pet)
    }

    /// Get a pet by ID
    pub async fn get_pet(&self, principal: &Principal, pet_id: i64) -> AppResult<Pet> {
        let mut conn = self.ctx.db().acquire().await?;
        let pet = PetRepository::find(&mut conn, pet_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Pet", pet_id))?;

        self.ctx
            .authorize(principal, Operation::GetPet, pet_target(&pet))
            .await?;

        debug!(pet_id, status = %pet.status, "Pet read");
        Ok(pet)
    }

    /// All pets for an administrator, the caller's own pets for an owner
    pub async fn list_pets(&self, principal: &Principal) -> AppResult<Vec<Pet>> {
        self.ctx
            .authorize(principal, Operation::ListPets, Target::Store)
            .await?;

        let mut conn = self.ctx.db().acquire().await?;
        let pets = match (principal.role(), principal.owner_id()) {
            (Some(Role::Admin), _) => PetRepository::list(&mut conn).await?,
            (_, Some(owner_id)) => PetRepository::list_by_owner(&mut conn, owner_id).await?,
            _ => Vec::new(),
        };

        debug!(count = pets.len(), "Pets listed");
        Ok(pets)
    }

    /// Pets free to be adopted
    pub async fn list_available_pets(&self, principal: &Principal) -> AppResult<Vec<Pet>> {
        self.ctx
            .authorize(principal, Operation::ListAvailablePets, Target::Store)
            .await?;

        let mut conn = self.ctx.db().acquire().await?;
        Ok(PetRepository::list_by_status(&mut conn, PetStatus::Available).await?)
    }

    /// Change a pet's attributes; status and owner are untouched
    pub async fn update_pet(
        &self,
        principal: &Principal,
        pet_id: i64,
        update: PetUpdate,
    ) -> AppResult<Pet> {
        PetValidator::validate_update(&update)?;

        with_conflict_retry(Operation::UpdatePet, self.ctx.retries(), || {
            self.try_update_pet(principal, pet_id, &update)
        })
        .await
    }

    async fn try_update_pet(
        &self,
        principal: &Principal,
        pet_id: i64,
        update: &PetUpdate,
    ) -> AppResult<Pet> {
        let mut uow = self.ctx.db().begin("update_pet").await?;
        let mut pet = PetRepository::find(uow.conn(), pet_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Pet", pet_id))?;

        self.ctx
            .authorize(principal, Operation::UpdatePet, pet_target(&pet))
            .await?;

        if pet.status.is_terminal() {
            return Err(ApplicationError::invalid_state("Pet", pet.status, "update"));
        }

        let read_status = pet.status;
        pet.apply(update);
        if !PetRepository::update(uow.conn(), &mut pet, read_status).await? {
            return Err(ApplicationError::conflict("Pet", pet_id));
        }

        let mut fields = Vec::new();
        if update.name.is_some() {
            fields.push("name");
        }
        if update.species.is_some() {
            fields.push("species");
        }
        if update.breed.is_some() {
            fields.push("breed");
        }
        if update.birth.is_some() {
            fields.push("birth");
        }
        PetRepository::save_event(uow.conn(), &PetEvent::updated(pet_id, principal.login(), &fields))
            .await?;
        uow.commit().await?;

        info!(pet_id, fields = ?fields, actor = %principal.login(), "Pet updated");
        Ok(pet)
    }

    /// Move a pet to REMOVED, unbinding its owner and dropping its records
    ///
    /// Rejected while an adoption is pending.
    pub async fn remove_pet(&self, principal: &Principal, pet_id: i64) -> AppResult<Pet> {
        with_conflict_retry(Operation::RemovePet, self.ctx.retries(), || {
            self.try_remove_pet(principal, pet_id)
        })
        .await
    }

    async fn try_remove_pet(&self, principal: &Principal, pet_id: i64) -> AppResult<Pet> {
        let mut uow = self.ctx.db().begin("remove_pet").await?;
        let mut pet = PetRepository::find(uow.conn(), pet_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Pet", pet_id))?;

        self.ctx
            .authorize(principal, Operation::RemovePet, pet_target(&pet))
            .await?;

        let previous = pet.status;
        pet.retire()
            .map_err(|e| ApplicationError::invalid_state("Pet", e.from, "remove"))?;

        let records = AdoptionRepository::delete_records_for_pet(uow.conn(), pet_id).await?;
        if !PetRepository::update(uow.conn(), &mut pet, previous).await? {
            return Err(ApplicationError::conflict("Pet", pet_id));
        }
        PetRepository::save_event(uow.conn(), &PetEvent::removed(pet_id, principal.login(), previous))
            .await?;
        uow.commit().await?;

        info!(
            pet_id,
            previous_status = %previous,
            records_deleted = records,
            actor = %principal.login(),
            "Pet removed"
        );
        Ok(pet)
    }

    /// Audit trail of a pet, oldest first
    pub async fn pet_history(&self, principal: &Principal, pet_id: i64) -> AppResult<Vec<PetEvent>> {
        let mut conn = self.ctx.db().acquire().await?;
        let pet = PetRepository::find(&mut conn, pet_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Pet", pet_id))?;

        self.ctx
            .authorize(principal, Operation::PetHistory, pet_target(&pet))
            .await?;

        Ok(PetRepository::get_events(&mut conn, pet_id).await?)
    }

    /// Owner and per-status pet counts
    pub async fn store_summary(&self, principal: &Principal) -> AppResult<StoreSummary> {
        self.ctx
            .authorize(principal, Operation::StoreSummary, Target::Store)
            .await?;

        let mut conn = self.ctx.db().acquire().await?;
        let summary = StoreSummary {
            owners: OwnerRepository::count(&mut conn).await?,
            available: PetRepository::count_by_status(&mut conn, PetStatus::Available).await?,
            pending: PetRepository::count_by_status(&mut conn, PetStatus::Pending).await?,
            adopted: PetRepository::count_by_status(&mut conn, PetStatus::Adopted).await?,
            removed: PetRepository::count_by_status(&mut conn, PetStatus::Removed).await?,
        };

        debug!(?summary, "Store summary read");
        Ok(summary)
    }
}
