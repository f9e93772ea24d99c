//! Data layer
//!
//! Storage access for the query pipeline. The pipeline depends only on the
//! [`Store`] trait; [`SqliteStore`] is the production backend.

pub mod error;
pub mod sqlite;
pub mod traits;

pub use error::StoreError;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreRow};
