//! Application service layer
//!
//! This layer validates input, opens the unit of work, consults the
//! authorizer and orchestrates the repositories. It is the public API for
//! presentation layers.

pub mod errors;
pub mod services;
pub mod validators;

pub use errors::{AppResult, ApplicationError, ErrorKind};
pub use services::{
    AdoptionService, OwnerService, PetService, PetStore, ServiceContext, StoreSummary, UserService,
};
