use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_CSV_DELIMITER, DEFAULT_DATABASE_PATH,
    DEFAULT_DATASET_NAME_LENGTH, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_QUERY_LIMIT,
};

// =============================================================================
// Text Match Enum
// =============================================================================

/// How a filter value with no operator syntax is matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMatch {
    /// Full-text prefix match (`field MATCH 'value*'`), for FTS5 tables
    #[default]
    Prefix,
    /// Exact equality (`field = 'value'`), for plain tables
    Equals,
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatch::Prefix => write!(f, "prefix"),
            TextMatch::Equals => write!(f, "equals"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<String>,
}

/// Query defaults section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub default_limit: Option<u64>,
    pub dataset_name_length: Option<usize>,
    pub text_match: Option<TextMatch>,
}

/// Export configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExportFileConfig {
    pub dir: Option<String>,
    pub csv_delimiter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub query: Option<QueryFileConfig>,
    pub export: Option<ExportFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            if query.default_limit.is_some() {
                tracing::trace!(limit = ?query.default_limit, "Merging query.default_limit");
                current.default_limit = query.default_limit;
            }
            if query.dataset_name_length.is_some() {
                tracing::trace!(
                    length = ?query.dataset_name_length,
                    "Merging query.dataset_name_length"
                );
                current.dataset_name_length = query.dataset_name_length;
            }
            if query.text_match.is_some() {
                tracing::trace!(mode = ?query.text_match, "Merging query.text_match");
                current.text_match = query.text_match;
            }
        }

        if let Some(export) = other.export {
            let current = self.export.get_or_insert_with(ExportFileConfig::default);
            if export.dir.is_some() {
                tracing::trace!(dir = ?export.dir, "Merging export.dir");
                current.dir = export.dir;
            }
            if export.csv_delimiter.is_some() {
                current.csv_delimiter = export.csv_delimiter;
            }
        }
    }
}

// =============================================================================
// Resolved Config Structs
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Defaults handed to the request validator and dataset introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Row limit applied when a request does not carry one
    pub default_limit: u64,
    /// Name length that marks a table as a dataset (0 disables the filter)
    pub dataset_name_length: usize,
    pub text_match: TextMatch,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_QUERY_LIMIT,
            dataset_name_length: DEFAULT_DATASET_NAME_LENGTH,
            text_match: TextMatch::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub dir: PathBuf,
    pub csv_delimiter: u8,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub query: QueryConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.sieve/sieve.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(cli, file_config)?;
        config.validate()?;

        tracing::debug!(
            database = %config.database.path.display(),
            default_limit = config.query.default_limit,
            text_match = %config.query.text_match,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_server = file_config.server.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();
        let file_export = file_config.export.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let database_path = cli
            .database
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .or(file_database.path)
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let database = DatabaseConfig {
            path: expand_path(&database_path),
        };

        let query = QueryConfig {
            default_limit: cli
                .default_limit
                .or(file_query.default_limit)
                .unwrap_or(DEFAULT_QUERY_LIMIT),
            dataset_name_length: cli
                .dataset_name_length
                .or(file_query.dataset_name_length)
                .unwrap_or(DEFAULT_DATASET_NAME_LENGTH),
            text_match: cli
                .text_match
                .or(file_query.text_match)
                .unwrap_or_default(),
        };

        let export_dir = cli
            .export_dir
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .or(file_export.dir)
            .unwrap_or_else(|| ".".to_string());
        let csv_delimiter = match file_export.csv_delimiter {
            Some(d) => parse_delimiter(&d)?,
            None => DEFAULT_CSV_DELIMITER as u8,
        };
        let export = ExportConfig {
            dir: expand_path(&export_dir),
            csv_delimiter,
        };

        Ok(Self {
            server,
            database,
            query,
            export,
        })
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would cause bind failure
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.database.path.as_os_str().is_empty() {
            anyhow::bail!("Configuration error: database.path must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
impl AppConfig {
    /// Defaults pointed at `path`, skipping every config file
    pub(crate) fn for_database(path: &Path) -> Self {
        let cli = CliConfig {
            database: Some(path.to_path_buf()),
            ..Default::default()
        };
        Self::resolve(&cli, FileConfig::default()).unwrap()
    }
}

/// Parse a CSV delimiter: exactly one ASCII character
fn parse_delimiter(s: &str) -> Result<u8> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => anyhow::bail!(
            "Configuration error: export.csv_delimiter must be a single ASCII character, got '{}'",
            s
        ),
    }
}

/// Get the profile config path (~/.sieve/sieve.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
