//! Owner domain module
//!
//! - **Entity**: `Owner`
//! - **Inputs**: `NewOwner`, `OwnerUpdate`
//! - **Repository**: `OwnerRepository`

pub mod owner;
pub mod repository;

pub use owner::{NewOwner, Owner, OwnerUpdate};
pub use repository::OwnerRepository;
