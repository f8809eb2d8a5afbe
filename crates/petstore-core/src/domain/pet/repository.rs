//! Pet repository for database operations
//!
//! Handles all database interactions for pets and pet events. Every
//! function runs on the connection it is given, so callers decide whether a
//! statement is part of a unit of work or a standalone read.

use super::event::{PetEvent, PetEventType};
use super::pet::{NewPet, Pet, PetStatus, Species};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteConnection;
use uuid::Uuid;

const PET_COLUMNS: &str =
    "id, name, species, breed, birth, status, owner_id, version, created_at, updated_at";

/// Repository for pet database operations
#[derive(Debug, Clone, Copy, Default)]
pub struct PetRepository;

impl PetRepository {
    // ========== Pet CRUD ==========

    /// Insert a new pet in AVAILABLE status
    pub async fn insert(conn: &mut SqliteConnection, new_pet: &NewPet) -> Result<Pet> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO pets (name, species, breed, birth, status, owner_id, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NULL, 0, ?, ?)
            "#,
        )
        .bind(&new_pet.name)
        .bind(new_pet.species.as_str())
        .bind(&new_pet.breed)
        .bind(new_pet.birth)
        .bind(PetStatus::Available.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(Pet {
            id: result.last_insert_rowid(),
            name: new_pet.name.clone(),
            species: new_pet.species,
            breed: new_pet.breed.clone(),
            birth: new_pet.birth,
            status: PetStatus::Available,
            owner_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Write a pet back, guarded by the version and status it was read with
    ///
    /// Returns `false` when another transaction changed the row first; the
    /// caller's copy is stale in that case. On success `pet.version` is bumped
    /// to match the stored row.
    pub async fn update(
        conn: &mut SqliteConnection,
        pet: &mut Pet,
        read_status: PetStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pets SET
                name = ?,
                species = ?,
                breed = ?,
                birth = ?,
                status = ?,
                owner_id = ?,
                version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ? AND status = ?
            "#,
        )
        .bind(&pet.name)
        .bind(pet.species.as_str())
        .bind(&pet.breed)
        .bind(pet.birth)
        .bind(pet.status.as_str())
        .bind(pet.owner_id)
        .bind(pet.updated_at)
        .bind(pet.id)
        .bind(pet.version)
        .bind(read_status.as_str())
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        if result.rows_affected() == 1 {
            pet.version += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Get a pet by ID
    pub async fn find(conn: &mut SqliteConnection, pet_id: i64) -> Result<Option<Pet>> {
        let row: Option<PetRow> =
            sqlx::query_as(&format!("SELECT {} FROM pets WHERE id = ?", PET_COLUMNS))
                .bind(pet_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(Error::DatabaseError)?;

        row.map(PetRow::into_pet).transpose()
    }

    /// List every pet, oldest first
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Pet>> {
        let rows: Vec<PetRow> =
            sqlx::query_as(&format!("SELECT {} FROM pets ORDER BY id", PET_COLUMNS))
                .fetch_all(&mut *conn)
                .await
                .map_err(Error::DatabaseError)?;

        rows.into_iter().map(PetRow::into_pet).collect()
    }

    /// List pets by status
    pub async fn list_by_status(conn: &mut SqliteConnection, status: PetStatus) -> Result<Vec<Pet>> {
        let rows: Vec<PetRow> = sqlx::query_as(&format!(
            "SELECT {} FROM pets WHERE status = ? ORDER BY id",
            PET_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(PetRow::into_pet).collect()
    }

    /// List pets bound to an owner
    pub async fn list_by_owner(conn: &mut SqliteConnection, owner_id: i64) -> Result<Vec<Pet>> {
        let rows: Vec<PetRow> = sqlx::query_as(&format!(
            "SELECT {} FROM pets WHERE owner_id = ? ORDER BY id",
            PET_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(PetRow::into_pet).collect()
    }

    /// Count pets bound to an owner
    pub async fn count_by_owner(conn: &mut SqliteConnection, owner_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pets WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(count)
    }

    /// Count pets by status
    pub async fn count_by_status(conn: &mut SqliteConnection, status: PetStatus) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pets WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(count)
    }

    // ========== Pet Events ==========

    /// Save a pet event
    pub async fn save_event(conn: &mut SqliteConnection, event: &PetEvent) -> Result<()> {
        let id = event.id.to_string();
        let data = event.data.as_ref().map(|d| d.to_string());

        sqlx::query(
            r#"
            INSERT INTO pet_events (id, pet_id, event_type, actor, data, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(event.pet_id)
        .bind(event.event_type.as_str())
        .bind(&event.actor)
        .bind(&data)
        .bind(event.created_at)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// Get events for a pet, oldest first
    pub async fn get_events(conn: &mut SqliteConnection, pet_id: i64) -> Result<Vec<PetEvent>> {
        let rows: Vec<PetEventRow> = sqlx::query_as(
            r#"
            SELECT id, pet_id, event_type, actor, data, created_at
            FROM pet_events
            WHERE pet_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(pet_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|row| row.into_event()).collect()
    }
}

// ========== Database Row Types ==========

#[derive(sqlx::FromRow)]
struct PetRow {
    id: i64,
    name: String,
    species: String,
    breed: Option<String>,
    birth: NaiveDate,
    status: String,
    owner_id: Option<i64>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PetRow {
    fn into_pet(self) -> Result<Pet> {
        let species = Species::from_str(&self.species)
            .ok_or_else(|| Error::Parse(format!("Invalid species: {}", self.species)))?;
        let status = PetStatus::from_str(&self.status)
            .ok_or_else(|| Error::Parse(format!("Invalid pet status: {}", self.status)))?;

        Ok(Pet {
            id: self.id,
            name: self.name,
            species,
            breed: self.breed,
            birth: self.birth,
            status,
            owner_id: self.owner_id,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PetEventRow {
    id: String,
    pet_id: i64,
    event_type: String,
    actor: String,
    data: Option<String>,
    created_at: DateTime<Utc>,
}

impl PetEventRow {
    fn into_event(self) -> Result<PetEvent> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid event ID: {}", e)))?;
        let event_type = PetEventType::from_str(&self.event_type)
            .ok_or_else(|| Error::Parse(format!("Invalid event type: {}", self.event_type)))?;
        let data = self
            .data
            .map(|d| serde_json::from_str(&d))
            .transpose()
            .map_err(|e| Error::Parse(format!("Invalid event data JSON: {}", e)))?;

        Ok(PetEvent {
            id,
            pet_id: self.pet_id,
            event_type,
            actor: self.actor,
            data,
            created_at: self.created_at,
        })
    }
}
