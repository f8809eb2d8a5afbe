//! Application validators
//!
//! Input validation run before a service opens its transaction.

pub mod owner_validator;
pub mod pet_validator;

pub use owner_validator::OwnerValidator;
pub use pet_validator::PetValidator;
