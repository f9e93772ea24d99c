//! Store trait
//!
//! The query pipeline talks to storage only through this trait. Every call
//! is self-contained: implementations open a connection, run one statement
//! and release the connection before returning.

use async_trait::async_trait;
use serde_json::Value;

use crate::data::error::StoreError;

/// One result row, values in select-list order
pub type StoreRow = Vec<Value>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Ordered column names of `table`. Fails with `UnknownTable` when the
    /// table does not exist.
    async fn columns(&self, table: &str) -> Result<Vec<String>, StoreError>;

    /// Names of all ordinary tables in the store
    async fn tables(&self) -> Result<Vec<String>, StoreError>;

    /// Run a parameterized statement and return every row
    async fn fetch_rows(&self, sql: &str, params: &[String]) -> Result<Vec<StoreRow>, StoreError>;

    /// Run a parameterized statement that yields a single integer
    async fn fetch_count(&self, sql: &str, params: &[String]) -> Result<u64, StoreError>;

    /// Insert one row of positional values into `table`
    async fn insert_row(&self, table: &str, values: &[String]) -> Result<(), StoreError>;
}
