//! Store error types
//!
//! Separates the three ways a store call can fail: the connection could not
//! be opened, the engine rejected the statement, or the statement ran into
//! some other driver-level problem.

use thiserror::Error;

/// Diagnostic SQLite FTS5 reports for an empty full-text term
pub const FTS5_EMPTY_TERM_DIAGNOSTIC: &str = "fts5: syntax error near \"\"";

/// Diagnostic SQLite FTS5 reports for a bound prefix term with no text (`*`)
pub const FTS5_EMPTY_PREFIX_DIAGNOSTIC: &str = "unknown special query";

#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be opened. Fatal to the current request.
    #[error("Failed to open database {path}: {source}")]
    Connectivity {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    /// The engine rejected the compiled statement (syntax or operational error)
    #[error("SQLite3 Operational Error: {0}")]
    Operational(String),

    /// Introspection found no columns for the table
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    /// Any other driver error (decode failures, protocol errors)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify an error raised while running a statement.
    ///
    /// Errors reported by the engine itself become `Operational`; everything
    /// else stays a driver error.
    pub fn from_statement(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => Self::Operational(db.message().to_string()),
            other => Self::Database(other),
        }
    }

    /// Whether the engine rejected a full-text search with an empty term
    pub fn is_empty_search(&self) -> bool {
        matches!(
            self,
            Self::Operational(msg)
                if msg == FTS5_EMPTY_TERM_DIAGNOSTIC || msg.starts_with(FTS5_EMPTY_PREFIX_DIAGNOSTIC)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operational_error_display() {
        let err = StoreError::Operational("no such column: colour".to_string());
        assert_eq!(
            err.to_string(),
            "SQLite3 Operational Error: no such column: colour"
        );
    }

    #[test]
    fn test_unknown_table_display() {
        let err = StoreError::UnknownTable("cats".to_string());
        assert_eq!(err.to_string(), "Table 'cats' does not exist");
    }

    #[test]
    fn test_is_empty_search() {
        assert!(StoreError::Operational(FTS5_EMPTY_TERM_DIAGNOSTIC.to_string()).is_empty_search());
        assert!(StoreError::Operational("unknown special query: ".to_string()).is_empty_search());
        assert!(!StoreError::Operational("no such table: cats".to_string()).is_empty_search());
        assert!(!StoreError::UnknownTable("cats".to_string()).is_empty_search());
    }

    #[test]
    fn test_from_statement_non_database_error() {
        let err = StoreError::from_statement(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
