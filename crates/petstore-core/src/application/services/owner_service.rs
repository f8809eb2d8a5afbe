//! Owner service
//!
//! Registers owners (optionally with a login), reads and updates their
//! contact details and removes them once nothing references them.

use super::ServiceContext;
use super::retry::with_conflict_retry;
use crate::application::errors::{AppResult, ApplicationError};
use crate::application::validators::OwnerValidator;
use crate::domain::adoption::AdoptionRepository;
use crate::domain::owner::{NewOwner, Owner, OwnerRepository, OwnerUpdate};
use crate::domain::pet::PetRepository;
use crate::domain::user::{User, UserRepository};
use crate::security::{Operation, PasswordHash, Principal, Target};
use tracing::{debug, info};

/// Service for owner operations
#[derive(Debug, Clone)]
pub struct OwnerService {
    ctx: ServiceContext,
}

impl OwnerService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register an owner, creating its OWNER user when credentials are given
    pub async fn register_owner(&self, principal: &Principal, new_owner: NewOwner) -> AppResult<Owner> {
        OwnerValidator::validate_new_owner(&new_owner)?;

        with_conflict_retry(Operation::RegisterOwner, self.ctx.retries(), || {
            self.try_register_owner(principal, &new_owner)
        })
        .await
    }

    async fn try_register_owner(&self, principal: &Principal, new_owner: &NewOwner) -> AppResult<Owner> {
        let mut uow = self.ctx.db().begin("register_owner").await?;
        self.ctx
            .authorize(principal, Operation::RegisterOwner, Target::Store)
            .await?;

        if let Some(credentials) = &new_owner.credentials {
            if UserRepository::exists(uow.conn(), &credentials.login).await? {
                return Err(ApplicationError::duplicate("login", &credentials.login));
            }
        }

        let email = new_owner
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        let mut owner = OwnerRepository::insert(uow.conn(), new_owner.name.trim(), email).await?;

        if let Some(credentials) = &new_owner.credentials {
            let hash = PasswordHash::digest(&credentials.password);
            let user = User::owner(&credentials.login, hash.into_string(), owner.id);
            UserRepository::insert(uow.conn(), &user).await?;
            owner.login = Some(user.login);
        }

        uow.commit().await?;

        info!(
            owner_id = owner.id,
            login = ?owner.login,
            actor = %principal.login(),
            "Owner registered"
        );
        Ok(owner)
    }

    /// Get an owner by ID
    pub async fn get_owner(&self, principal: &Principal, owner_id: i64) -> AppResult<Owner> {
        let mut conn = self.ctx.db().acquire().await?;
        let owner = OwnerRepository::find(&mut conn, owner_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Owner", owner_id))?;

        self.ctx
            .authorize(principal, Operation::GetOwner, Target::Owner { owner_id })
            .await?;

        debug!(owner_id, "Owner read");
        Ok(owner)
    }

    /// Get the owner linked to a login
    pub async fn get_owner_by_login(&self, principal: &Principal, login: &str) -> AppResult<Owner> {
        let mut conn = self.ctx.db().acquire().await?;
        let owner = OwnerRepository::find_by_login(&mut conn, login)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Owner", login))?;

        self.ctx
            .authorize(principal, Operation::GetOwner, Target::Owner { owner_id: owner.id })
            .await?;

        Ok(owner)
    }

    /// List every owner
    pub async fn list_owners(&self, principal: &Principal) -> AppResult<Vec<Owner>> {
        self.ctx
            .authorize(principal, Operation::ListOwners, Target::Store)
            .await?;

        let mut conn = self.ctx.db().acquire().await?;
        let owners = OwnerRepository::list(&mut conn).await?;
        debug!(count = owners.len(), "Owners listed");
        Ok(owners)
    }

    /// Owners currently bound to a pet with the given name
    pub async fn find_owners_by_pet_name(
        &self,
        principal: &Principal,
        pet_name: &str,
    ) -> AppResult<Vec<Owner>> {
        self.ctx
            .authorize(principal, Operation::FindOwnersByPetName, Target::Store)
            .await?;

        let mut conn = self.ctx.db().acquire().await?;
        Ok(OwnerRepository::find_by_pet_name(&mut conn, pet_name.trim()).await?)
    }

    /// Change contact details and/or the linked user's password
    pub async fn update_owner(
        &self,
        principal: &Principal,
        owner_id: i64,
        update: OwnerUpdate,
    ) -> AppResult<Owner> {
        OwnerValidator::validate_update(&update)?;

        with_conflict_retry(Operation::UpdateOwner, self.ctx.retries(), || {
            self.try_update_owner(principal, owner_id, &update)
        })
        .await
    }

    async fn try_update_owner(
        &self,
        principal: &Principal,
        owner_id: i64,
        update: &OwnerUpdate,
    ) -> AppResult<Owner> {
        let mut uow = self.ctx.db().begin("update_owner").await?;
        let mut owner = OwnerRepository::find(uow.conn(), owner_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Owner", owner_id))?;

        self.ctx
            .authorize(principal, Operation::UpdateOwner, Target::Owner { owner_id })
            .await?;

        if update.touches_contact() {
            owner.apply(update);
            if !OwnerRepository::update(uow.conn(), &owner).await? {
                return Err(ApplicationError::conflict("Owner", owner_id));
            }
        }

        if let Some(password) = &update.password {
            let login = owner.login.as_deref().ok_or_else(|| {
                ApplicationError::validation("password", "Owner has no login to set a password on")
            })?;
            let hash = PasswordHash::digest(password);
            if !UserRepository::update_password(uow.conn(), login, hash.as_str()).await? {
                return Err(ApplicationError::conflict("User", login));
            }
        }

        uow.commit().await?;

        info!(
            owner_id,
            password_changed = update.password.is_some(),
            actor = %principal.login(),
            "Owner updated"
        );
        Ok(owner)
    }

    /// Remove an owner with no bound pets, open intents or adoption records
    pub async fn remove_owner(&self, principal: &Principal, owner_id: i64) -> AppResult<()> {
        with_conflict_retry(Operation::RemoveOwner, self.ctx.retries(), || {
            self.try_remove_owner(principal, owner_id)
        })
        .await
    }

    async fn try_remove_owner(&self, principal: &Principal, owner_id: i64) -> AppResult<()> {
        let mut uow = self.ctx.db().begin("remove_owner").await?;
        OwnerRepository::find(uow.conn(), owner_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Owner", owner_id))?;

        self.ctx
            .authorize(principal, Operation::RemoveOwner, Target::Owner { owner_id })
            .await?;

        let pets = PetRepository::count_by_owner(uow.conn(), owner_id).await?;
        if pets > 0 {
            return Err(ApplicationError::invalid_state(
                "Owner",
                format!("{} pets bound", pets),
                "remove",
            ));
        }

        let intents = AdoptionRepository::count_intents_for_owner(uow.conn(), owner_id).await?;
        if intents > 0 {
            return Err(ApplicationError::invalid_state(
                "Owner",
                format!("{} adoptions pending", intents),
                "remove",
            ));
        }

        let records = AdoptionRepository::count_records_for_owner(uow.conn(), owner_id).await?;
        if records > 0 {
            return Err(ApplicationError::invalid_state(
                "Owner",
                format!("{} adoption records", records),
                "remove",
            ));
        }

        if !OwnerRepository::delete(uow.conn(), owner_id).await? {
            return Err(ApplicationError::conflict("Owner", owner_id));
        }
        uow.commit().await?;

        info!(owner_id, actor = %principal.login(), "Owner removed");
        Ok(())
    }
}
