//! Dataset service
//!
//! Binds the query pipeline to one table of a store: introspection,
//! validated queries and counts, row insertion and file export. Every call
//! re-reads the schema; nothing is cached between requests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::{ExportConfig, QueryConfig};
use crate::core::constants::EXPORT_NAME_TOKEN_BYTES;
use crate::data::error::StoreError;
use crate::data::traits::Store;
use crate::utils::file::unique_file_in;

use super::export::{self, ExportError, ExportFormat};
use super::query::{
    CompiledQuery, Materialized, QueryMode, RawRequest, Record, Schema, ValidationError, compile,
    count, materialize, validate,
};

/// Message reported for every statement the engine rejects
pub const OPERATIONAL_ERROR_MESSAGE: &str = "SQLite3 Operational Error";
/// Appended when the rejected statement was an empty full-text search
pub const EMPTY_SEARCH_HINT: &str = "search returned no results";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Dataset '{0}' does not exist")]
    UnknownDataset(String),

    #[error("Expected {expected} values, got {got}")]
    ValueCount { expected: usize, got: usize },

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl DatasetError {
    /// Client-facing message. Engine diagnostics are kept out of it and
    /// reported separately by [`DatasetError::detail`].
    pub fn message(&self) -> String {
        match self {
            Self::Store(e @ StoreError::Operational(_)) => {
                if e.is_empty_search() {
                    format!("{}: {}", OPERATIONAL_ERROR_MESSAGE, EMPTY_SEARCH_HINT)
                } else {
                    OPERATIONAL_ERROR_MESSAGE.to_string()
                }
            }
            other => other.to_string(),
        }
    }

    /// Machine-readable detail: the validation code or the engine diagnostic
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Validation(e) => Some(e.code().to_string()),
            Self::Store(StoreError::Operational(diagnostic)) => Some(diagnostic.clone()),
            _ => None,
        }
    }
}

/// Result of a select, shaped for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn failure(err: &DatasetError) -> Self {
        Self {
            success: false,
            data: None,
            fields: None,
            message: Some(err.message()),
            error: err.detail(),
        }
    }
}

impl From<Materialized> for QueryResponse {
    fn from(result: Materialized) -> Self {
        Self {
            success: true,
            data: Some(result.records),
            fields: Some(result.fields),
            message: None,
            error: None,
        }
    }
}

/// Result of a count, shaped for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CountResponse {
    pub fn failure(err: &DatasetError) -> Self {
        Self {
            success: false,
            count: None,
            message: Some(err.message()),
            error: err.detail(),
        }
    }
}

impl From<u64> for CountResponse {
    fn from(count: u64) -> Self {
        Self {
            success: true,
            count: Some(count),
            message: None,
            error: None,
        }
    }
}

/// Tables whose name length marks them as datasets.
///
/// A `name_length` of 0 lists every table.
pub async fn list_datasets(store: &dyn Store, name_length: usize) -> Result<Vec<String>, StoreError> {
    let tables = store.tables().await?;
    Ok(tables
        .into_iter()
        .filter(|name| name_length == 0 || name.chars().count() == name_length)
        .collect())
}

pub struct Dataset {
    store: Arc<dyn Store>,
    table: String,
    config: QueryConfig,
}

impl Dataset {
    /// Bind to `table` after checking it is a listed dataset.
    ///
    /// The table name is interpolated into statements later on, so only
    /// names the store itself reports are accepted.
    pub async fn open(
        store: Arc<dyn Store>,
        table: &str,
        config: QueryConfig,
    ) -> Result<Self, DatasetError> {
        let datasets = list_datasets(store.as_ref(), config.dataset_name_length).await?;
        if !datasets.iter().any(|name| name == table) {
            return Err(DatasetError::UnknownDataset(table.to_string()));
        }

        tracing::debug!(%table, backend = store.name(), "Dataset opened");
        Ok(Self {
            store,
            table: table.to_string(),
            config,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn schema(&self) -> Result<Schema, DatasetError> {
        let columns = self.store.columns(&self.table).await?;
        Ok(Schema::new(self.table.clone(), columns))
    }

    /// Column names in declaration order
    pub async fn fields(&self) -> Result<Vec<String>, DatasetError> {
        Ok(self.schema().await?.columns().to_vec())
    }

    /// Validate `raw` against a fresh schema and compile it
    pub async fn prepare(&self, raw: &RawRequest, mode: QueryMode) -> Result<CompiledQuery, DatasetError> {
        let schema = self.schema().await?;
        let validated = validate(raw, &schema, &self.config).inspect_err(|e| {
            tracing::debug!(table = %self.table, code = e.code(), value = e.value(), "Request rejected");
        })?;
        Ok(compile(&validated, mode))
    }

    pub async fn query(&self, raw: &RawRequest) -> Result<Materialized, DatasetError> {
        let compiled = self.prepare(raw, QueryMode::Select).await?;
        let result = materialize(self.store.as_ref(), &compiled)
            .await
            .inspect_err(|e| log_store_error(&self.table, &compiled, e))?;
        Ok(result)
    }

    /// [`Dataset::query`] shaped as a response; never fails
    pub async fn json(&self, raw: &RawRequest) -> QueryResponse {
        match self.query(raw).await {
            Ok(result) => result.into(),
            Err(e) => QueryResponse::failure(&e),
        }
    }

    pub async fn count(&self, raw: &RawRequest) -> Result<u64, DatasetError> {
        let compiled = self.prepare(raw, QueryMode::Count).await?;
        let total = count(self.store.as_ref(), &compiled)
            .await
            .inspect_err(|e| log_store_error(&self.table, &compiled, e))?;
        Ok(total)
    }

    /// Insert one row of positional values.
    ///
    /// With `generate_id` a fresh UUID fills the first column and is
    /// returned. The value count must match the schema exactly.
    pub async fn create(
        &self,
        values: Vec<String>,
        generate_id: bool,
    ) -> Result<Option<String>, DatasetError> {
        let schema = self.schema().await?;

        let id = generate_id.then(|| Uuid::new_v4().simple().to_string());
        let row: Vec<String> = id.iter().cloned().chain(values).collect();

        if row.len() != schema.len() {
            return Err(DatasetError::ValueCount {
                expected: schema.len(),
                got: row.len(),
            });
        }

        self.store.insert_row(&self.table, &row).await?;
        Ok(id)
    }

    /// Run `raw` without a row limit and write every record to a file.
    ///
    /// Without a `destination` the file lands in the configured export
    /// directory under a random name. Returns the path written.
    pub async fn export(
        &self,
        raw: &RawRequest,
        format: ExportFormat,
        destination: Option<&Path>,
        config: &ExportConfig,
    ) -> Result<PathBuf, DatasetError> {
        let compiled = self.prepare(raw, QueryMode::Export).await?;
        tracing::debug!(table = %self.table, sql = %compiled.inlined(), "Exporting");

        let result = materialize(self.store.as_ref(), &compiled)
            .await
            .inspect_err(|e| log_store_error(&self.table, &compiled, e))?;

        let path = match destination {
            Some(path) => path.to_path_buf(),
            None => {
                let token = hex::encode(&Uuid::new_v4().as_bytes()[..EXPORT_NAME_TOKEN_BYTES]);
                unique_file_in(&config.dir, &self.table, &token, format.extension())
            }
        };

        export::write(&result, format, &path, config.csv_delimiter)?;
        Ok(path)
    }
}

fn log_store_error(table: &str, compiled: &CompiledQuery, e: &StoreError) {
    match e {
        StoreError::Operational(diagnostic) => {
            tracing::warn!(%table, sql = %compiled.inlined(), %diagnostic, "Statement rejected")
        }
        other => tracing::error!(%table, error = %other, "Store failure"),
    }
}
