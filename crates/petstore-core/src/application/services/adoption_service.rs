//! Adoption service
//!
//! Drives a pet through AVAILABLE -> PENDING -> ADOPTED (or back to
//! AVAILABLE on cancel). Each transition writes the pet with a guarded
//! update, so two transactions racing on one pet cannot both succeed.

use super::ServiceContext;
use super::pet_service::pet_target;
use super::retry::with_conflict_retry;
use crate::application::errors::{AppResult, ApplicationError};
use crate::domain::adoption::{AdoptionIntent, AdoptionRecord, AdoptionRepository};
use crate::domain::owner::OwnerRepository;
use crate::domain::pet::{Pet, PetEvent, PetRepository, PetStatus};
use crate::security::{Operation, Principal, Target};
use crate::storage::UnitOfWork;
use tracing::info;

/// Service for adoption operations
#[derive(Debug, Clone)]
pub struct AdoptionService {
    ctx: ServiceContext,
}

async fn load_pet(uow: &mut UnitOfWork, pet_id: i64) -> AppResult<Pet> {
    PetRepository::find(uow.conn(), pet_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Pet", pet_id))
}

impl AdoptionService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open an adoption of an AVAILABLE pet on behalf of `owner_id`
    pub async fn initiate_adoption(
        &self,
        principal: &Principal,
        pet_id: i64,
        owner_id: i64,
    ) -> AppResult<AdoptionIntent> {
        with_conflict_retry(Operation::InitiateAdoption, self.ctx.retries(), || {
            self.try_initiate_adoption(principal, pet_id, owner_id)
        })
        .await
    }

    async fn try_initiate_adoption(
        &self,
        principal: &Principal,
        pet_id: i64,
        owner_id: i64,
    ) -> AppResult<AdoptionIntent> {
        let mut uow = self.ctx.db().begin("initiate_adoption").await?;
        let mut pet = load_pet(&mut uow, pet_id).await?;
        OwnerRepository::find(uow.conn(), owner_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Owner", owner_id))?;

        self.ctx
            .authorize(
                principal,
                Operation::InitiateAdoption,
                Target::Intent { pet_id, owner_id },
            )
            .await?;

        let read_status = pet.status;
        pet.reserve()
            .map_err(|e| ApplicationError::invalid_state("Pet", e.from, "initiate adoption of"))?;

        if !PetRepository::update(uow.conn(), &mut pet, read_status).await? {
            return Err(ApplicationError::conflict("Pet", pet_id));
        }

        let intent = AdoptionIntent::new(pet_id, owner_id);
        AdoptionRepository::insert_intent(uow.conn(), &intent)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    ApplicationError::conflict("Pet", pet_id)
                } else {
                    e.into()
                }
            })?;
        PetRepository::save_event(
            uow.conn(),
            &PetEvent::adoption_initiated(pet_id, principal.login(), owner_id),
        )
        .await?;
        uow.commit().await?;

        info!(pet_id, owner_id, actor = %principal.login(), "Adoption initiated");
        Ok(intent)
    }

    /// Complete the pending adoption of a pet
    ///
    /// Binds the pet to the intent holder, closes the intent and writes the
    /// adoption record, all in one transaction.
    pub async fn finalize_adoption(
        &self,
        principal: &Principal,
        pet_id: i64,
    ) -> AppResult<AdoptionRecord> {
        with_conflict_retry(Operation::FinalizeAdoption, self.ctx.retries(), || {
            self.try_finalize_adoption(principal, pet_id)
        })
        .await
    }

    async fn try_finalize_adoption(
        &self,
        principal: &Principal,
        pet_id: i64,
    ) -> AppResult<AdoptionRecord> {
        let mut uow = self.ctx.db().begin("finalize_adoption").await?;
        let mut pet = load_pet(&mut uow, pet_id).await?;

        self.ctx
            .authorize(principal, Operation::FinalizeAdoption, pet_target(&pet))
            .await?;

        let intent = match AdoptionRepository::find_intent(uow.conn(), pet_id).await? {
            Some(intent) if pet.status == PetStatus::Pending => intent,
            _ => {
                return Err(ApplicationError::invalid_state(
                    "Pet",
                    pet.status,
                    "finalize adoption of",
                ));
            }
        };

        pet.adopt(intent.owner_id)
            .map_err(|e| ApplicationError::invalid_state("Pet", e.from, "finalize adoption of"))?;
        if !PetRepository::update(uow.conn(), &mut pet, PetStatus::Pending).await? {
            return Err(ApplicationError::conflict("Pet", pet_id));
        }
        if !AdoptionRepository::delete_intent(uow.conn(), pet_id).await? {
            return Err(ApplicationError::conflict("Pet", pet_id));
        }

        let record = AdoptionRepository::insert_record(uow.conn(), pet_id, intent.owner_id).await?;
        PetRepository::save_event(
            uow.conn(),
            &PetEvent::adoption_finalized(pet_id, principal.login(), intent.owner_id, record.id),
        )
        .await?;
        uow.commit().await?;

        info!(
            pet_id,
            owner_id = intent.owner_id,
            record_id = record.id,
            actor = %principal.login(),
            "Adoption finalized"
        );
        Ok(record)
    }

    /// Withdraw a pending adoption; the pet becomes AVAILABLE again
    pub async fn cancel_adoption(&self, principal: &Principal, pet_id: i64) -> AppResult<Pet> {
        with_conflict_retry(Operation::CancelAdoption, self.ctx.retries(), || {
            self.try_cancel_adoption(principal, pet_id)
        })
        .await
    }

    async fn try_cancel_adoption(&self, principal: &Principal, pet_id: i64) -> AppResult<Pet> {
        let mut uow = self.ctx.db().begin("cancel_adoption").await?;
        let mut pet = load_pet(&mut uow, pet_id).await?;
        let intent = AdoptionRepository::find_intent(uow.conn(), pet_id).await?;

        let target = match &intent {
            Some(intent) => Target::Intent {
                pet_id,
                owner_id: intent.owner_id,
            },
            None => pet_target(&pet),
        };
        self.ctx
            .authorize(principal, Operation::CancelAdoption, target)
            .await?;

        let intent = match intent {
            Some(intent) if pet.status == PetStatus::Pending => intent,
            _ => {
                return Err(ApplicationError::invalid_state(
                    "Pet",
                    pet.status,
                    "cancel adoption of",
                ));
            }
        };

        pet.release()
            .map_err(|e| ApplicationError::invalid_state("Pet", e.from, "cancel adoption of"))?;
        if !PetRepository::update(uow.conn(), &mut pet, PetStatus::Pending).await? {
            return Err(ApplicationError::conflict("Pet", pet_id));
        }
        if !AdoptionRepository::delete_intent(uow.conn(), pet_id).await? {
            return Err(ApplicationError::conflict("Pet", pet_id));
        }
        PetRepository::save_event(
            uow.conn(),
            &PetEvent::adoption_cancelled(pet_id, principal.login(), intent.owner_id),
        )
        .await?;
        uow.commit().await?;

        info!(
            pet_id,
            owner_id = intent.owner_id,
            actor = %principal.login(),
            "Adoption cancelled"
        );
        Ok(pet)
    }

    /// Completed adoptions of a pet
    pub async fn adoption_records_for_pet(
        &self,
        principal: &Principal,
        pet_id: i64,
    ) -> AppResult<Vec<AdoptionRecord>> {
        let mut conn = self.ctx.db().acquire().await?;
        let pet = PetRepository::find(&mut conn, pet_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Pet", pet_id))?;

        self.ctx
            .authorize(principal, Operation::ViewAdoptionRecords, pet_target(&pet))
            .await?;

        Ok(AdoptionRepository::records_for_pet(&mut conn, pet_id).await?)
    }

    /// Completed adoptions by an owner
    pub async fn adoption_records_for_owner(
        &self,
        principal: &Principal,
        owner_id: i64,
    ) -> AppResult<Vec<AdoptionRecord>> {
        let mut conn = self.ctx.db().acquire().await?;
        OwnerRepository::find(&mut conn, owner_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Owner", owner_id))?;

        self.ctx
            .authorize(
                principal,
                Operation::ViewAdoptionRecords,
                Target::Owner { owner_id },
            )
            .await?;

        Ok(AdoptionRepository::records_for_owner(&mut conn, owner_id).await?)
    }

    /// The open intent on a pet, if any
    pub async fn pending_intent(
        &self,
        principal: &Principal,
        pet_id: i64,
    ) -> AppResult<Option<AdoptionIntent>> {
        let mut conn = self.ctx.db().acquire().await?;
        let pet = PetRepository::find(&mut conn, pet_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Pet", pet_id))?;
        let intent = AdoptionRepository::find_intent(&mut conn, pet_id).await?;

        let target = match &intent {
            Some(intent) => Target::Intent {
                pet_id,
                owner_id: intent.owner_id,
            },
            None => pet_target(&pet),
        };
        self.ctx
            .authorize(principal, Operation::ViewAdoptionRecords, target)
            .await?;

        Ok(intent)
    }
}
