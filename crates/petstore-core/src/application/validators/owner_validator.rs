//! Owner and user input validation

use crate::application::errors::{AppResult, ApplicationError};
use crate::domain::owner::{NewOwner, OwnerUpdate};
use crate::security::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOGIN_LENGTH: usize = 100;

/// Validator for owner and user operations
pub struct OwnerValidator;

impl OwnerValidator {
    /// Validate an owner name
    ///
    /// Rules:
    /// - Must not be blank
    /// - Must be 100 characters or less
    pub fn validate_name(name: &str) -> AppResult<()> {
        let name = name.trim();

        if name.is_empty() {
            return Err(ApplicationError::validation("name", "Owner name cannot be empty"));
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ApplicationError::validation(
                "name",
                "Owner name must be 100 characters or less",
            ));
        }

        Ok(())
    }

    /// Validate an email address
    ///
    /// Rules:
    /// - Blank means "no email"
    /// - Otherwise a single '@' with text on both sides, no whitespace
    pub fn validate_email(email: &str) -> AppResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(());
        }

        if email.len() > MAX_EMAIL_LENGTH {
            return Err(ApplicationError::validation(
                "email",
                "Email must be 254 characters or less",
            ));
        }

        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(ApplicationError::validation(
                "email",
                "Email must look like name@domain",
            ));
        }

        Ok(())
    }

    /// Validate a login
    ///
    /// Rules:
    /// - Must not be empty or contain whitespace or ':'
    /// - Must be 100 characters or less
    pub fn validate_login(login: &str) -> AppResult<()> {
        if login.is_empty() {
            return Err(ApplicationError::validation("login", "Login cannot be empty"));
        }

        if login.chars().count() > MAX_LOGIN_LENGTH {
            return Err(ApplicationError::validation(
                "login",
                "Login must be 100 characters or less",
            ));
        }

        if login.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(ApplicationError::validation(
                "login",
                "Login cannot contain whitespace or ':'",
            ));
        }

        Ok(())
    }

    /// Validate a new password
    pub fn validate_password(password: &str) -> AppResult<()> {
        let length = password.chars().count();

        if length < MIN_PASSWORD_LENGTH {
            return Err(ApplicationError::validation(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }

        if length > MAX_PASSWORD_LENGTH {
            return Err(ApplicationError::validation(
                "password",
                format!("Password must be {} characters or less", MAX_PASSWORD_LENGTH),
            ));
        }

        Ok(())
    }

    /// Validate everything needed to register an owner
    pub fn validate_new_owner(new_owner: &NewOwner) -> AppResult<()> {
        Self::validate_name(&new_owner.name)?;
        if let Some(email) = &new_owner.email {
            Self::validate_email(email)?;
        }
        if let Some(credentials) = &new_owner.credentials {
            Self::validate_login(&credentials.login)?;
            Self::validate_password(&credentials.password)?;
        }
        Ok(())
    }

    /// Validate an owner update
    pub fn validate_update(update: &OwnerUpdate) -> AppResult<()> {
        if update.is_empty() {
            return Err(ApplicationError::validation("update", "Nothing to update"));
        }
        if let Some(name) = &update.name {
            Self::validate_name(name)?;
        }
        if let Some(Some(email)) = &update.email {
            Self::validate_email(email)?;
        }
        if let Some(password) = &update.password {
            Self::validate_password(password)?;
        }
        Ok(())
    }
}
