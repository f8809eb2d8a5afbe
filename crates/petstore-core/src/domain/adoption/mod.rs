//! Adoption domain module
//!
//! - **Entities**: `AdoptionIntent` (open, one per pet), `AdoptionRecord`
//!   (completed, immutable)
//! - **Repository**: `AdoptionRepository`

pub mod adoption;
pub mod repository;

pub use adoption::{AdoptionIntent, AdoptionRecord};
pub use repository::AdoptionRepository;
