//! SQLite store
//!
//! Request-scoped access to a SQLite database file. Every operation opens
//! its own connection, runs a single statement and closes the connection,
//! so nothing is pooled or cached between calls.

mod row;
#[cfg(test)]
pub(crate) mod test_support;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::log::LevelFilter;

use crate::core::constants::SQLITE_BUSY_TIMEOUT_SECS;
use crate::data::error::StoreError;
use crate::data::traits::{Store, StoreRow};

/// SQLite-backed store
pub struct SqliteStore {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl SqliteStore {
    /// Point the store at an existing database file.
    ///
    /// No connection is made here; a missing file surfaces as a
    /// `Connectivity` error on first use.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
            .log_statements(LevelFilter::Trace);

        tracing::debug!(path = %path.display(), "SqliteStore configured");
        Self { path, options }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection, StoreError> {
        self.options
            .connect()
            .await
            .map_err(|source| StoreError::Connectivity {
                path: self.path.display().to_string(),
                source,
            })
    }
}

async fn release(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close SQLite connection");
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_scalar::<_, String>(
            "SELECT name FROM pragma_table_info(?) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&mut conn)
        .await;
        release(conn).await;

        let columns = result.map_err(StoreError::from_statement)?;
        if columns.is_empty() {
            return Err(StoreError::UnknownTable(table.to_string()));
        }
        tracing::trace!(%table, ?columns, "Introspected table columns");
        Ok(columns)
    }

    async fn tables(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&mut conn)
        .await;
        release(conn).await;

        result.map_err(StoreError::from_statement)
    }

    async fn fetch_rows(&self, sql: &str, params: &[String]) -> Result<Vec<StoreRow>, StoreError> {
        let mut query = sqlx::query(sql);
        for value in params {
            query = query.bind(value.as_str());
        }

        let mut conn = self.connect().await?;
        let result = query.fetch_all(&mut conn).await;
        release(conn).await;

        let rows = result.map_err(StoreError::from_statement)?;
        let decoded = rows
            .iter()
            .map(row::decode_row)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::trace!(rows = decoded.len(), "Fetched rows");
        Ok(decoded)
    }

    async fn fetch_count(&self, sql: &str, params: &[String]) -> Result<u64, StoreError> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        for value in params {
            query = query.bind(value.as_str());
        }

        let mut conn = self.connect().await?;
        let result = query.fetch_one(&mut conn).await;
        release(conn).await;

        let count = result.map_err(StoreError::from_statement)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn insert_row(&self, table: &str, values: &[String]) -> Result<(), StoreError> {
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!("INSERT INTO {} VALUES ({})", table, placeholders);

        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value.as_str());
        }

        let mut conn = self.connect().await?;
        let result = query.execute(&mut conn).await;
        release(conn).await;

        let done = result.map_err(StoreError::from_statement)?;
        tracing::debug!(%table, rows = done.rows_affected(), "Inserted row");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::dogs_store;
    use super::*;

    #[tokio::test]
    async fn test_columns_in_declaration_order() {
        let (_dir, store) = dogs_store().await;
        let columns = store.columns("dogs").await.unwrap();
        assert_eq!(columns, vec!["id", "name", "age"]);
    }

    #[tokio::test]
    async fn test_columns_unknown_table() {
        let (_dir, store) = dogs_store().await;
        let err = store.columns("wolves").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(ref t) if t == "wolves"));
    }

    #[tokio::test]
    async fn test_tables_include_fts_shadow_tables() {
        let (_dir, store) = dogs_store().await;
        let tables = store.tables().await.unwrap();
        assert!(tables.contains(&"dogs".to_string()));
        assert!(tables.contains(&"cat".to_string()));
        assert!(tables.iter().any(|t| t.starts_with("dogs_")));
    }

    #[tokio::test]
    async fn test_fetch_rows_binds_parameters() {
        let (_dir, store) = dogs_store().await;
        let rows = store
            .fetch_rows(
                "SELECT id, name FROM dogs WHERE dogs.id MATCH ?",
                &["0001*".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![vec![serde_json::json!("0001"), serde_json::json!("Rex")]]);
    }

    #[tokio::test]
    async fn test_fetch_rows_bound_value_is_not_sql() {
        let (_dir, store) = dogs_store().await;
        let rows = store
            .fetch_rows(
                "SELECT id FROM cat WHERE name = ?",
                &["x' OR '1'='1".to_string()],
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_rows_empty_match_is_operational() {
        let (_dir, store) = dogs_store().await;
        let err = store
            .fetch_rows("SELECT id FROM dogs WHERE dogs.id MATCH ?", &["*".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Operational(_)));
    }

    #[tokio::test]
    async fn test_fetch_count() {
        let (_dir, store) = dogs_store().await;
        let count = store.fetch_count("SELECT count(*) FROM dogs", &[]).await.unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_insert_row() {
        let (_dir, store) = dogs_store().await;
        store
            .insert_row(
                "cat",
                &["7".to_string(), "Mittens".to_string(), "2".to_string()],
            )
            .await
            .unwrap();
        let count = store
            .fetch_count("SELECT count(*) FROM cat WHERE name = ?", &["Mittens".to_string()])
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_missing_database_is_connectivity_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("absent.db"));
        let err = store.tables().await.unwrap_err();
        assert!(matches!(err, StoreError::Connectivity { .. }));
    }
}
