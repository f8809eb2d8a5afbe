//! Storage layer - SQLite
//!
//! Provides the database handle, schema migrations and the scoped
//! transaction type every service operation runs in.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `unit_of_work`: One transaction per service call, rolled back on drop
//!
//! # Usage
//!
//! ```ignore
//! use petstore_core::storage::Database;
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! let mut uow = db.begin("register_pet").await?;
//! // ... statements through uow.conn() ...
//! uow.commit().await?;
//! ```

pub mod database;
pub mod migrations;
pub mod unit_of_work;

// Re-export commonly used types
pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
pub use unit_of_work::UnitOfWork;
