use async_trait::async_trait;
use sqlx::SqlitePool;
use wordbook_core::{LocalStore, LocalStoreError};

/// On-device key-value store backed by the `kv` table.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Removes a key. Returns true if something was stored under it.
    pub async fn delete(&self, key: &str) -> Result<bool, LocalStoreError> {
        let result = sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

fn db_error(e: sqlx::Error) -> LocalStoreError {
    LocalStoreError::Database(e.to_string())
}

#[async_trait]
impl LocalStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}
