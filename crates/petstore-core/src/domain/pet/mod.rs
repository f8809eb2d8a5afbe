//! Pet domain module
//!
//! # Architecture
//!
//! - **Entities**: `Pet`, `PetEvent`
//! - **Value types**: `Species`, `PetStatus`, `NewPet`, `PetUpdate`
//! - **Repository**: `PetRepository` for database operations
//!
//! Status changes go through the methods on [`Pet`] (`reserve`, `adopt`,
//! `release`, `retire`), which reject any edge outside the lifecycle graph.

pub mod event;
pub mod pet;
pub mod repository;

pub use event::{PetEvent, PetEventType};
pub use pet::{InvalidTransition, NewPet, Pet, PetStatus, PetUpdate, Species};
pub use repository::PetRepository;
