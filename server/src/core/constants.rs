// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Sieve";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "sieve";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".sieve";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "sieve.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SIEVE_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "SIEVE_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "SIEVE_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SIEVE_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Maximum request body size for row insertion (64KB)
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Seconds to wait for in-flight requests during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Environment variable for the SQLite database file
pub const ENV_DATABASE: &str = "SIEVE_DATABASE";

/// Default SQLite database file (relative to the working directory)
pub const DEFAULT_DATABASE_PATH: &str = "sieve.db";

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Query Defaults
// =============================================================================

/// Environment variable for the default row limit
pub const ENV_DEFAULT_LIMIT: &str = "SIEVE_DEFAULT_LIMIT";

/// Environment variable for the dataset table-name length
pub const ENV_DATASET_NAME_LENGTH: &str = "SIEVE_DATASET_NAME_LENGTH";

/// Environment variable for the text match mode (prefix or equals)
pub const ENV_TEXT_MATCH: &str = "SIEVE_TEXT_MATCH";

/// Rows returned when a request does not carry a limit
pub const DEFAULT_QUERY_LIMIT: u64 = 1000;

/// Table name length that marks a table as a dataset (0 lists every table)
pub const DEFAULT_DATASET_NAME_LENGTH: usize = 3;

// =============================================================================
// Export Defaults
// =============================================================================

/// Environment variable for the export output directory
pub const ENV_EXPORT_DIR: &str = "SIEVE_EXPORT_DIR";

/// Default CSV field delimiter
pub const DEFAULT_CSV_DELIMITER: char = ';';

/// Random bytes in generated export file names
pub const EXPORT_NAME_TOKEN_BYTES: usize = 8;
