//! Scoped transactions
//!
//! A [`UnitOfWork`] wraps one SQLite transaction. Services open one per call,
//! run every read and write of the operation through [`UnitOfWork::conn`],
//! and call [`UnitOfWork::commit`] once all invariants hold. Any other exit,
//! including `?` on an error and a panic, drops the value and the
//! transaction is rolled back before the connection is reused.

use crate::error::{Error, Result};
use sqlx::sqlite::{Sqlite, SqliteConnection};
use sqlx::{SqlitePool, Transaction};
use std::fmt;
use std::time::Instant;

/// A transactional unit of work
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    label: &'static str,
    started: Instant,
}

impl UnitOfWork {
    pub(crate) async fn begin(pool: &SqlitePool, label: &'static str) -> Result<Self> {
        let tx = pool.begin().await.map_err(Error::DatabaseError)?;
        tracing::trace!(unit_of_work = label, "Transaction opened");
        Ok(Self {
            tx,
            label,
            started: Instant::now(),
        })
    }

    /// Connection bound to this transaction
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Name of the operation that opened this unit of work
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Commit every statement executed through this unit of work
    pub async fn commit(self) -> Result<()> {
        let label = self.label;
        let elapsed = self.started.elapsed();
        self.tx.commit().await.map_err(Error::DatabaseError)?;
        tracing::debug!(
            unit_of_work = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "Transaction committed"
        );
        Ok(())
    }

    /// Roll back explicitly instead of waiting for drop
    pub async fn rollback(self) -> Result<()> {
        let label = self.label;
        self.tx.rollback().await.map_err(Error::DatabaseError)?;
        tracing::debug!(unit_of_work = label, "Transaction rolled back");
        Ok(())
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn count_owners(db: &Database) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM owners")
            .fetch_one(db.pool())
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_commit_persists_changes() {
        let db = Database::in_memory().await.unwrap();

        let mut uow = db.begin("test").await.unwrap();
        sqlx::query("INSERT INTO owners (name) VALUES ('Jane Doe')")
            .execute(uow.conn())
            .await
            .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(count_owners(&db).await, 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::in_memory().await.unwrap();

        {
            let mut uow = db.begin("test").await.unwrap();
            sqlx::query("INSERT INTO owners (name) VALUES ('Jane Doe')")
                .execute(uow.conn())
                .await
                .unwrap();
        }

        assert_eq!(count_owners(&db).await, 0);
    }

    #[tokio::test]
    async fn test_early_return_rolls_back() {
        let db = Database::in_memory().await.unwrap();

        async fn failing(db: &Database) -> crate::error::Result<()> {
            let mut uow = db.begin("failing").await?;
            sqlx::query("INSERT INTO owners (name) VALUES ('Jane Doe')")
                .execute(uow.conn())
                .await?;
            Err(crate::error::Error::Parse("boom".into()))
        }

        assert!(failing(&db).await.is_err());
        assert_eq!(count_owners(&db).await, 0);
    }

    #[tokio::test]
    async fn test_explicit_rollback() {
        let db = Database::in_memory().await.unwrap();

        let mut uow = db.begin("test").await.unwrap();
        assert_eq!(uow.label(), "test");
        sqlx::query("INSERT INTO owners (name) VALUES ('Jane Doe')")
            .execute(uow.conn())
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        assert_eq!(count_owners(&db).await, 0);
    }
}
