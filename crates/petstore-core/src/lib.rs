//! Pet Store Core Library
//!
//! This crate provides the transactional business-service layer of the pet
//! store:
//! - Domain entities and repositories (owners, pets, adoptions, users)
//! - Security (principals, authorization policy, password digests, Basic auth)
//! - Storage (SQLite, migrations, units of work)
//! - Application services with validation and conflict retry
//! - Configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod security;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::{
        AppResult, ApplicationError, ErrorKind, PetStore, ServiceContext,
    };
    pub use crate::config::Config;
    pub use crate::domain::adoption::{AdoptionIntent, AdoptionRecord};
    pub use crate::domain::owner::{NewOwner, Owner, OwnerUpdate};
    pub use crate::domain::pet::{NewPet, Pet, PetEvent, PetStatus, PetUpdate, Species};
    pub use crate::domain::user::{Role, User};
    pub use crate::error::{Error, Result};
    pub use crate::security::{Authorizer, Credentials, IdentityStore, Principal, RolePolicy};
    pub use crate::storage::Database;
}
