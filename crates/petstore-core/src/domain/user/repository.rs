//! User repository for database operations

use super::user::{Role, User};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;

/// Repository for user database operations
#[derive(Debug, Clone, Copy, Default)]
pub struct UserRepository;

impl UserRepository {
    /// Save a new user; a taken login surfaces as a unique violation
    pub async fn insert(conn: &mut SqliteConnection, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (login, password_hash, role, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.owner_id)
        .bind(user.created_at)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// Get a user by login
    pub async fn find(conn: &mut SqliteConnection, login: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT login, password_hash, role, owner_id, created_at FROM users WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get the user linked to an owner
    pub async fn find_by_owner(conn: &mut SqliteConnection, owner_id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT login, password_hash, role, owner_id, created_at FROM users WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(UserRow::into_user).transpose()
    }

    /// Whether a login is taken
    pub async fn exists(conn: &mut SqliteConnection, login: &str) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE login = ?")
            .bind(login)
            .fetch_one(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(count > 0)
    }

    /// Replace a user's password digest
    pub async fn update_password(
        conn: &mut SqliteConnection,
        login: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE login = ?")
            .bind(password_hash)
            .bind(login)
            .execute(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Count users holding a role
    pub async fn count_by_role(conn: &mut SqliteConnection, role: Role) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(count)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    login: String,
    password_hash: String,
    role: String,
    owner_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let role = Role::from_str(&self.role)
            .ok_or_else(|| Error::Parse(format!("Invalid role: {}", self.role)))?;

        Ok(User {
            login: self.login,
            password_hash: self.password_hash,
            role,
            owner_id: self.owner_id,
            created_at: self.created_at,
        })
    }
}
