//! User domain module
//!
//! - **Entity**: `User`, with its `Role`
//! - **Repository**: `UserRepository`

pub mod repository;
pub mod user;

pub use repository::UserRepository;
pub use user::{Role, User};
