//! Security: who is calling and what they may do
//!
//! # Architecture
//!
//! - `principal`: the caller identity passed to every service operation
//! - `authorizer`: the `Authorizer` capability and the default `RolePolicy`
//! - `password`: password digests
//! - `basic`: HTTP Basic header parsing into `Credentials`
//! - `identity`: `IdentityStore`, turning credentials into a principal
//!
//! # Example
//!
//! ```ignore
//! use petstore_core::security::{Credentials, IdentityStore};
//!
//! let identities = IdentityStore::new(db.clone());
//! identities.bootstrap_admin("admin", "changeme").await?;
//!
//! let principal = identities
//!     .authenticate(&Credentials::new("admin", "changeme"))
//!     .await?;
//! ```

pub mod authorizer;
pub mod basic;
pub mod identity;
pub mod password;
pub mod principal;

pub use authorizer::{Authorizer, Decision, Operation, RolePolicy, Target};
pub use basic::{Credentials, parse_basic_header};
pub use identity::IdentityStore;
pub use password::PasswordHash;
pub use principal::{Identity, Principal};
