//! Database migrations
//!
//! This module manages SQLite schema migrations for the pet store.
//! Migrations are versioned and applied automatically on database connection.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Initial schema
const MIGRATION_V1: &str = r#"
    -- Owners (contact records; pets are associated, not contained)
    CREATE TABLE IF NOT EXISTS owners (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_owners_name ON owners(name);

    -- Users able to authenticate against the store
    CREATE TABLE IF NOT EXISTS users (
        login TEXT PRIMARY KEY NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('admin', 'owner')),
        owner_id INTEGER UNIQUE REFERENCES owners(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK ((role = 'owner') = (owner_id IS NOT NULL))
    );

    -- Pets owned by the store, optionally bound to an owner
    CREATE TABLE IF NOT EXISTS pets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        species TEXT NOT NULL CHECK (species IN ('bird', 'cat', 'dog', 'rabbit', 'other')),
        breed TEXT,
        birth DATE NOT NULL,
        status TEXT NOT NULL DEFAULT 'available' CHECK (status IN ('available', 'pending', 'adopted', 'removed')),
        owner_id INTEGER REFERENCES owners(id) ON DELETE RESTRICT,
        version INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_pets_status ON pets(status);
    CREATE INDEX IF NOT EXISTS idx_pets_owner_id ON pets(owner_id);
    CREATE INDEX IF NOT EXISTS idx_pets_name ON pets(name);

    -- Open adoption intents, at most one per pet
    CREATE TABLE IF NOT EXISTS adoption_intents (
        pet_id INTEGER PRIMARY KEY NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
        owner_id INTEGER NOT NULL REFERENCES owners(id) ON DELETE RESTRICT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_adoption_intents_owner_id ON adoption_intents(owner_id);

    -- Completed adoptions
    CREATE TABLE IF NOT EXISTS adoption_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pet_id INTEGER NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
        owner_id INTEGER NOT NULL REFERENCES owners(id) ON DELETE RESTRICT,
        adopted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_adoption_records_pet_id ON adoption_records(pet_id);
    CREATE INDEX IF NOT EXISTS idx_adoption_records_owner_id ON adoption_records(owner_id);

    CREATE TRIGGER IF NOT EXISTS adoption_records_immutable
    BEFORE UPDATE ON adoption_records
    BEGIN
        SELECT RAISE(ABORT, 'adoption records are immutable');
    END;
"#;

/// Migration 2: Pet audit trail
const MIGRATION_V2: &str = r#"
    CREATE TABLE IF NOT EXISTS pet_events (
        id TEXT PRIMARY KEY NOT NULL,
        pet_id INTEGER NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
        event_type TEXT NOT NULL CHECK (event_type IN (
            'registered', 'updated', 'adoption_initiated',
            'adoption_finalized', 'adoption_cancelled', 'removed'
        )),
        actor TEXT NOT NULL,
        data TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_pet_events_pet_id ON pet_events(pet_id);
    CREATE INDEX IF NOT EXISTS idx_pet_events_created_at ON pet_events(created_at);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    // MAX() yields NULL on an empty table
    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

/// Apply a migration and record it in one transaction
async fn apply_migration(pool: &SqlitePool, version: i32, sql: &str) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::raw_sql(sql).execute(&mut *tx).await?;

    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Initial schema");
        apply_migration(pool, 1, MIGRATION_V1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Pet audit trail");
        apply_migration(pool, 2, MIGRATION_V2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check whether any migration is pending
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    Ok(get_current_version(pool).await? < CURRENT_VERSION)
}

/// Report the schema version of the database
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}
