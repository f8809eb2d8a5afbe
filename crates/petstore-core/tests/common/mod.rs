//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use petstore_core::prelude::*;
use petstore_core::storage::DatabaseConfig;
use tempfile::TempDir;

pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "changeme";

/// A store with one administrator
pub struct Fixture {
    pub db: Database,
    pub store: PetStore,
    pub identities: IdentityStore,
    pub admin: Principal,
    _dir: Option<TempDir>,
}

impl Fixture {
    /// Single-connection in-memory store
    pub async fn in_memory() -> Self {
        let db = Database::in_memory().await.unwrap();
        Self::with_db(db, None).await
    }

    /// File-backed store with several pooled connections
    pub async fn file_backed() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::with_path(dir.path().join("petstore.db")).max_connections(4);
        let db = Database::new(config).await.unwrap();
        Self::with_db(db, Some(dir)).await
    }

    async fn with_db(db: Database, dir: Option<TempDir>) -> Self {
        let identities = IdentityStore::new(db.clone());
        identities
            .bootstrap_admin(ADMIN_LOGIN, ADMIN_PASSWORD)
            .await
            .unwrap();
        let admin = identities
            .authenticate(&Credentials::new(ADMIN_LOGIN, ADMIN_PASSWORD))
            .await
            .unwrap();

        let store = PetStore::new(ServiceContext::with_role_policy(db.clone()));

        Self {
            db,
            store,
            identities,
            admin,
            _dir: dir,
        }
    }

    /// Register an owner with a login and return it with its principal
    pub async fn owner(&self, name: &str, login: &str) -> (Owner, Principal) {
        let owner = self
            .store
            .owners
            .register_owner(
                &self.admin,
                NewOwner::new(name).with_credentials(Credentials::new(login, "secret1")),
            )
            .await
            .unwrap();
        let principal = self
            .identities
            .authenticate(&Credentials::new(login, "secret1"))
            .await
            .unwrap();
        (owner, principal)
    }

    /// Register a pet as the administrator
    pub async fn pet(&self, name: &str) -> Pet {
        self.store
            .pets
            .register_pet(&self.admin, NewPet::new(name, Species::Dog, birth()))
            .await
            .unwrap()
    }

    /// Fetch a pet as the administrator
    pub async fn reload(&self, pet_id: i64) -> Pet {
        self.store.pets.get_pet(&self.admin, pet_id).await.unwrap()
    }

    /// Number of open intents on a pet
    pub async fn intents_for(&self, pet_id: i64) -> i64 {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM adoption_intents WHERE pet_id = ?")
                .bind(pet_id)
                .fetch_one(self.db.pool())
                .await
                .unwrap();
        count
    }
}

pub fn birth() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 4, 12).unwrap()
}
