use crate::db::DbPool;
use crate::error::CoreError;
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

use super::{OccurrenceStore, Storage};

/// SQLite implementation of [`Storage`]
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: DbPool,
}

impl SqliteStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    type Store = SqliteStore;

    async fn begin(&self) -> Result<SqliteStore, CoreError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteStore { tx })
    }
}

/// A unit of work backed by one SQLite transaction.
///
/// The domain operations live in `series.rs` and `tasks.rs`.
pub struct SqliteStore {
    pub(crate) tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl OccurrenceStore for SqliteStore {
    async fn commit(self) -> Result<(), CoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
