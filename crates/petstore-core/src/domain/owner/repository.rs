//! Owner repository for database operations

use super::owner::Owner;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;

const OWNER_SELECT: &str = r#"
    SELECT o.id, o.name, o.email, u.login, o.created_at, o.updated_at
    FROM owners o
    LEFT JOIN users u ON u.owner_id = o.id
"#;

/// Repository for owner database operations
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerRepository;

impl OwnerRepository {
    /// Insert a new owner record (without a linked user)
    pub async fn insert(
        conn: &mut SqliteConnection,
        name: &str,
        email: Option<&str>,
    ) -> Result<Owner> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO owners (name, email, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(Owner {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            email: email.map(str::to_string),
            login: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Update contact fields
    pub async fn update(conn: &mut SqliteConnection, owner: &Owner) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE owners SET
                name = ?,
                email = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&owner.name)
        .bind(&owner.email)
        .bind(owner.updated_at)
        .bind(owner.id)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Get an owner by ID
    pub async fn find(conn: &mut SqliteConnection, owner_id: i64) -> Result<Option<Owner>> {
        let row: Option<OwnerRow> = sqlx::query_as(&format!("{} WHERE o.id = ?", OWNER_SELECT))
            .bind(owner_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(row.map(OwnerRow::into_owner))
    }

    /// Get the owner linked to a login
    pub async fn find_by_login(conn: &mut SqliteConnection, login: &str) -> Result<Option<Owner>> {
        let row: Option<OwnerRow> = sqlx::query_as(&format!("{} WHERE u.login = ?", OWNER_SELECT))
            .bind(login)
            .fetch_optional(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(row.map(OwnerRow::into_owner))
    }

    /// List all owners by name
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Owner>> {
        let rows: Vec<OwnerRow> = sqlx::query_as(&format!("{} ORDER BY o.name, o.id", OWNER_SELECT))
            .fetch_all(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(OwnerRow::into_owner).collect())
    }

    /// Owners currently bound to at least one pet with the given name
    pub async fn find_by_pet_name(conn: &mut SqliteConnection, pet_name: &str) -> Result<Vec<Owner>> {
        let rows: Vec<OwnerRow> = sqlx::query_as(&format!(
            "{} WHERE o.id IN (SELECT owner_id FROM pets WHERE name = ? AND owner_id IS NOT NULL) ORDER BY o.name, o.id",
            OWNER_SELECT
        ))
        .bind(pet_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(rows.into_iter().map(OwnerRow::into_owner).collect())
    }

    /// Delete an owner; its linked user goes with it
    pub async fn delete(conn: &mut SqliteConnection, owner_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM owners WHERE id = ?")
            .bind(owner_id)
            .execute(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Count owners
    pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM owners")
            .fetch_one(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(count)
    }
}

#[derive(sqlx::FromRow)]
struct OwnerRow {
    id: i64,
    name: String,
    email: Option<String>,
    login: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OwnerRow {
    fn into_owner(self) -> Owner {
        Owner {
            id: self.id,
            name: self.name,
            email: self.email,
            login: self.login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
