//! Adoption repository for database operations
//!
//! Intents are inserted and deleted; records are only ever inserted, or
//! deleted together with their pet's removal.

use super::adoption::{AdoptionIntent, AdoptionRecord};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;

/// Repository for adoption database operations
#[derive(Debug, Clone, Copy, Default)]
pub struct AdoptionRepository;

impl AdoptionRepository {
    // ========== Intents ==========

    /// Save an intent; fails with a unique violation if the pet already has one
    pub async fn insert_intent(conn: &mut SqliteConnection, intent: &AdoptionIntent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO adoption_intents (pet_id, owner_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(intent.pet_id)
        .bind(intent.owner_id)
        .bind(intent.created_at)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// Get the open intent for a pet
    pub async fn find_intent(
        conn: &mut SqliteConnection,
        pet_id: i64,
    ) -> Result<Option<AdoptionIntent>> {
        let row: Option<IntentRow> = sqlx::query_as(
            "SELECT pet_id, owner_id, created_at FROM adoption_intents WHERE pet_id = ?",
        )
        .bind(pet_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(row.map(IntentRow::into_intent))
    }

    /// Delete the open intent for a pet
    pub async fn delete_intent(conn: &mut SqliteConnection, pet_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM adoption_intents WHERE pet_id = ?")
            .bind(pet_id)
            .execute(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Count open intents held by an owner
    pub async fn count_intents_for_owner(conn: &mut SqliteConnection, owner_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM adoption_intents WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(&mut *conn)
                .await
                .map_err(Error::DatabaseError)?;

        Ok(count)
    }

    // ========== Records ==========

    /// Write a record of a completed adoption
    pub async fn insert_record(
        conn: &mut SqliteConnection,
        pet_id: i64,
        owner_id: i64,
    ) -> Result<AdoptionRecord> {
        let adopted_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO adoption_records (pet_id, owner_id, adopted_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(pet_id)
        .bind(owner_id)
        .bind(adopted_at)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(AdoptionRecord {
            id: result.last_insert_rowid(),
            pet_id,
            owner_id,
            adopted_at,
        })
    }

    /// Records for a pet, oldest first
    pub async fn records_for_pet(
        conn: &mut SqliteConnection,
        pet_id: i64,
    ) -> Result<Vec<AdoptionRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, pet_id, owner_id, adopted_at
            FROM adoption_records
            WHERE pet_id = ?
            ORDER BY adopted_at, id
            "#,
        )
        .bind(pet_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(RecordRow::into_record).collect())
    }

    /// Records for an owner, oldest first
    pub async fn records_for_owner(
        conn: &mut SqliteConnection,
        owner_id: i64,
    ) -> Result<Vec<AdoptionRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, pet_id, owner_id, adopted_at
            FROM adoption_records
            WHERE owner_id = ?
            ORDER BY adopted_at, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(RecordRow::into_record).collect())
    }

    /// Delete every record for a pet
    pub async fn delete_records_for_pet(conn: &mut SqliteConnection, pet_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM adoption_records WHERE pet_id = ?")
            .bind(pet_id)
            .execute(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected())
    }

    /// Count records held by an owner
    pub async fn count_records_for_owner(conn: &mut SqliteConnection, owner_id: i64) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM adoption_records WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(&mut *conn)
                .await
                .map_err(Error::DatabaseError)?;

        Ok(count)
    }
}

#[derive(sqlx::FromRow)]
struct IntentRow {
    pet_id: i64,
    owner_id: i64,
    created_at: DateTime<Utc>,
}

impl IntentRow {
    fn into_intent(self) -> AdoptionIntent {
        AdoptionIntent {
            pet_id: self.pet_id,
            owner_id: self.owner_id,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    pet_id: i64,
    owner_id: i64,
    adopted_at: DateTime<Utc>,
}

impl RecordRow {
    fn into_record(self) -> AdoptionRecord {
        AdoptionRecord {
            id: self.id,
            pet_id: self.pet_id,
            owner_id: self.owner_id,
            adopted_at: self.adopted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::owner::OwnerRepository;
    use crate::domain::pet::{NewPet, PetRepository, Species};
    use crate::storage::Database;
    use chrono::NaiveDate;

    async fn seed(conn: &mut SqliteConnection) -> (i64, i64) {
        let owner = OwnerRepository::insert(conn, "Jane Doe", None).await.unwrap();
        let birth = NaiveDate::from_ymd_opt(2020, 2, 2).unwrap();
        let pet = PetRepository::insert(conn, &NewPet::new("Rex", Species::Dog, birth))
            .await
            .unwrap();
        (pet.id, owner.id)
    }

    #[tokio::test]
    async fn test_single_intent_per_pet() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let (pet_id, owner_id) = seed(&mut conn).await;

        AdoptionRepository::insert_intent(&mut conn, &AdoptionIntent::new(pet_id, owner_id))
            .await
            .unwrap();

        let err = AdoptionRepository::insert_intent(&mut conn, &AdoptionIntent::new(pet_id, owner_id))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        let intent = AdoptionRepository::find_intent(&mut conn, pet_id).await.unwrap().unwrap();
        assert_eq!(intent.owner_id, owner_id);
        assert_eq!(AdoptionRepository::count_intents_for_owner(&mut conn, owner_id).await.unwrap(), 1);

        assert!(AdoptionRepository::delete_intent(&mut conn, pet_id).await.unwrap());
        assert!(AdoptionRepository::find_intent(&mut conn, pet_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let (pet_id, owner_id) = seed(&mut conn).await;

        let record = AdoptionRepository::insert_record(&mut conn, pet_id, owner_id).await.unwrap();
        assert!(record.id > 0);

        let by_pet = AdoptionRepository::records_for_pet(&mut conn, pet_id).await.unwrap();
        assert_eq!(by_pet, vec![record.clone()]);
        let by_owner = AdoptionRepository::records_for_owner(&mut conn, owner_id).await.unwrap();
        assert_eq!(by_owner.len(), 1);

        assert_eq!(AdoptionRepository::delete_records_for_pet(&mut conn, pet_id).await.unwrap(), 1);
        assert_eq!(AdoptionRepository::count_records_for_owner(&mut conn, owner_id).await.unwrap(), 0);
    }
}
