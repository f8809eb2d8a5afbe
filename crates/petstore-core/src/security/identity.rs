//! Resolving principals from credentials
//!
//! The identity store is the service layer's login. Presentation layers hand
//! it whatever credentials the caller supplied and pass the resulting
//! [`Principal`] to every service call.

use super::basic::{Credentials, parse_basic_header};
use super::password::PasswordHash;
use super::principal::Principal;
use crate::application::errors::{AppResult, ApplicationError};
use crate::application::validators::OwnerValidator;
use crate::domain::user::{Role, User, UserRepository};
use crate::storage::Database;
use tracing::{debug, info, warn};

/// Looks up users and verifies their passwords
#[derive(Debug, Clone)]
pub struct IdentityStore {
    db: Database,
}

impl IdentityStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Verify credentials and return the matching principal
    ///
    /// Unknown logins and wrong passwords fail the same way.
    pub async fn authenticate(&self, credentials: &Credentials) -> AppResult<Principal> {
        let mut conn = self.db.acquire().await?;
        let user = UserRepository::find(&mut conn, &credentials.login).await?;

        let verified = user.filter(|u| {
            PasswordHash::from_stored(u.password_hash.as_str()).verify(&credentials.password)
        });

        match verified {
            Some(user) => {
                debug!(login = %user.login, role = %user.role, "Authenticated");
                Ok(Principal::from_user(&user))
            }
            None => {
                warn!(login = %credentials.login, "Authentication failed");
                Err(ApplicationError::unauthorized(
                    "authenticate",
                    "invalid login or password",
                ))
            }
        }
    }

    /// Authenticate from an `Authorization` header value
    ///
    /// A missing header yields the anonymous principal; a malformed one is an
    /// authorization failure.
    pub async fn authenticate_header(&self, header: Option<&str>) -> AppResult<Principal> {
        let Some(header) = header else {
            return Ok(Principal::Anonymous);
        };
        let credentials = parse_basic_header(header).ok_or_else(|| {
            ApplicationError::unauthorized("authenticate", "malformed Basic authorization header")
        })?;
        self.authenticate(&credentials).await
    }

    /// Create the first administrator
    ///
    /// Fails with a validation error when the login is taken.
    pub async fn bootstrap_admin(&self, login: &str, password: &str) -> AppResult<User> {
        OwnerValidator::validate_login(login)?;
        OwnerValidator::validate_password(password)?;

        let mut uow = self.db.begin("bootstrap_admin").await?;
        if UserRepository::exists(uow.conn(), login).await? {
            return Err(ApplicationError::duplicate("login", login));
        }

        let user = User::admin(login, PasswordHash::digest(password).into_string());
        UserRepository::insert(uow.conn(), &user).await?;
        uow.commit().await?;

        info!(login = %login, "Administrator created");
        Ok(user)
    }

    /// Whether any administrator exists yet
    pub async fn has_admin(&self) -> AppResult<bool> {
        let mut conn = self.db.acquire().await?;
        Ok(UserRepository::count_by_role(&mut conn, Role::Admin).await? > 0)
    }
}
