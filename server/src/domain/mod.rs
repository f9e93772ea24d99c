//! Domain logic
//!
//! - `query` - filter validation, predicate translation and query compilation
//! - `dataset` - one store table wired to the query pipeline
//! - `export` - CSV and JSON file output

pub mod dataset;
pub mod export;
pub mod query;

pub use dataset::{CountResponse, Dataset, DatasetError, QueryResponse, list_datasets};
pub use export::{ExportError, ExportFormat};
