//! Application services
//!
//! Every service is constructed from a [`ServiceContext`] holding the
//! database handle, the authorizer and the conflict retry count. Mutating
//! operations run in one unit of work: load the target, ask the authorizer,
//! check the business rules, write, commit.

pub mod adoption_service;
pub mod owner_service;
pub mod pet_service;
pub mod retry;
pub mod user_service;

pub use adoption_service::AdoptionService;
pub use owner_service::OwnerService;
pub use pet_service::{PetService, StoreSummary};
pub use retry::{MAX_CONFLICT_RETRIES, with_conflict_retry};
pub use user_service::UserService;

use crate::application::errors::{AppResult, ApplicationError};
use crate::security::{Authorizer, Decision, Operation, Principal, RolePolicy, Target};
use crate::storage::Database;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Default number of times a conflicting mutation is rerun
pub const DEFAULT_CONFLICT_RETRIES: u32 = 1;

/// Collaborators shared by every service
#[derive(Clone)]
pub struct ServiceContext {
    db: Database,
    authorizer: Arc<dyn Authorizer>,
    conflict_retries: u32,
}

impl ServiceContext {
    pub fn new(db: Database, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            db,
            authorizer,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    /// Context using the default [`RolePolicy`]
    pub fn with_role_policy(db: Database) -> Self {
        Self::new(db, Arc::new(RolePolicy::new()))
    }

    /// Set how many times a conflicting mutation is rerun
    pub fn conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries.min(MAX_CONFLICT_RETRIES);
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn retries(&self) -> u32 {
        self.conflict_retries
    }

    /// Ask the authorizer; a denial becomes an authorization error
    pub(crate) async fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
        target: Target,
    ) -> AppResult<()> {
        match self.authorizer.authorize(principal, operation, &target).await {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(
                    login = %principal.login(),
                    operation = %operation,
                    target = ?target,
                    reason = %reason,
                    "Authorization denied"
                );
                Err(ApplicationError::unauthorized(operation, reason))
            }
        }
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("db", &self.db.path())
            .field("conflict_retries", &self.conflict_retries)
            .finish_non_exhaustive()
    }
}

/// All services over one context
#[derive(Debug, Clone)]
pub struct PetStore {
    pub owners: OwnerService,
    pub pets: PetService,
    pub adoptions: AdoptionService,
    pub users: UserService,
}

impl PetStore {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            owners: OwnerService::new(ctx.clone()),
            pets: PetService::new(ctx.clone()),
            adoptions: AdoptionService::new(ctx.clone()),
            users: UserService::new(ctx),
        }
    }
}
