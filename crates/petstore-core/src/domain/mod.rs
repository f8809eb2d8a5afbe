//! Domain layer
//!
//! Entities, their lifecycle rules and the repositories that persist them.

pub mod adoption;
pub mod owner;
pub mod pet;
pub mod user;
