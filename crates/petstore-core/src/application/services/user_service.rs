//! User service

use super::ServiceContext;
use crate::application::errors::{AppResult, ApplicationError};
use crate::domain::user::{User, UserRepository};
use crate::security::{Operation, Principal, Target};

/// Service for user operations
#[derive(Debug, Clone)]
pub struct UserService {
    ctx: ServiceContext,
}

impl UserService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// The stored user behind the principal
    pub async fn current_user(&self, principal: &Principal) -> AppResult<User> {
        self.ctx
            .authorize(principal, Operation::CurrentUser, Target::Store)
            .await?;

        let mut conn = self.ctx.db().acquire().await?;
        UserRepository::find(&mut conn, principal.login())
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", principal.login()))
    }
}
