use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::TextMatch;
use super::constants::{
    ENV_CONFIG, ENV_DATABASE, ENV_DATASET_NAME_LENGTH, ENV_DEFAULT_LIMIT, ENV_EXPORT_DIR,
    ENV_HOST, ENV_PORT, ENV_TEXT_MATCH,
};
use crate::domain::export::ExportFormat;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(version, about = "Filter-to-query compiler for SQLite datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, short = 'd', global = true, env = ENV_DATABASE)]
    pub database: Option<PathBuf>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Row limit for requests that do not set one
    #[arg(long, global = true, env = ENV_DEFAULT_LIMIT)]
    pub default_limit: Option<u64>,

    /// Table name length that marks a dataset (0 lists every table)
    #[arg(long, global = true, env = ENV_DATASET_NAME_LENGTH)]
    pub dataset_name_length: Option<usize>,

    /// How plain filter values match (prefix or equals)
    #[arg(long, global = true, env = ENV_TEXT_MATCH, value_parser = parse_text_match)]
    pub text_match: Option<TextMatch>,

    /// Directory for exports without an explicit output path
    #[arg(long, global = true, env = ENV_EXPORT_DIR)]
    pub export_dir: Option<PathBuf>,
}

/// Parse text match mode from CLI/env string
fn parse_text_match(s: &str) -> Result<TextMatch, String> {
    match s.to_lowercase().as_str() {
        "prefix" => Ok(TextMatch::Prefix),
        "equals" => Ok(TextMatch::Equals),
        _ => Err(format!(
            "Invalid text match mode '{}'. Valid options: prefix, equals",
            s
        )),
    }
}

/// Parse export format from CLI string
fn parse_export_format(s: &str) -> Result<ExportFormat, String> {
    match s.to_lowercase().as_str() {
        "csv" => Ok(ExportFormat::Csv),
        "json" => Ok(ExportFormat::Json),
        _ => Err(format!(
            "Invalid export format '{}'. Valid options: csv, json",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the HTTP server (default command)
    Serve,
    /// List dataset tables
    Datasets,
    /// Print the fields of a dataset
    Fields {
        table: String,
    },
    /// Run a query and print the JSON response
    Query {
        table: String,
        /// Options and filters as key=value (e.g. age=<5 order_by=name,desc)
        filters: Vec<String>,
    },
    /// Count matching rows
    Count {
        table: String,
        /// Options and filters as key=value
        filters: Vec<String>,
    },
    /// Write every matching row to a file
    Export {
        table: String,
        /// Output format (csv or json)
        #[arg(long, short = 'f', default_value = "csv", value_parser = parse_export_format)]
        format: ExportFormat,
        /// Output path (defaults to a random name in the export directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Options and filters as key=value
        filters: Vec<String>,
    },
    /// Insert one row of positional values
    Insert {
        table: String,
        /// Prepend a generated id for the first column
        #[arg(long)]
        generate_id: bool,
        values: Vec<String>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub default_limit: Option<u64>,
    pub dataset_name_length: Option<usize>,
    pub text_match: Option<TextMatch>,
    pub export_dir: Option<PathBuf>,
}

impl Cli {
    fn into_parts(self) -> (CliConfig, Option<Commands>) {
        let config = CliConfig {
            config: self.config,
            database: self.database,
            host: self.host,
            port: self.port,
            default_limit: self.default_limit,
            dataset_name_length: self.dataset_name_length,
            text_match: self.text_match,
            export_dir: self.export_dir,
        };
        (config, self.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    Cli::parse().into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> (CliConfig, Option<Commands>) {
        Cli::try_parse_from(args).unwrap().into_parts()
    }

    #[test]
    fn test_no_command_defaults_to_none() {
        let (config, command) = parse_from(&["sieve"]);
        assert!(command.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn test_global_flags() {
        let (config, command) = parse_from(&[
            "sieve",
            "datasets",
            "--database",
            "dogs.db",
            "--text-match",
            "EQUALS",
            "--dataset-name-length",
            "0",
        ]);
        assert!(matches!(command, Some(Commands::Datasets)));
        assert_eq!(config.database, Some(PathBuf::from("dogs.db")));
        assert_eq!(config.text_match, Some(TextMatch::Equals));
        assert_eq!(config.dataset_name_length, Some(0));
    }

    #[test]
    fn test_query_filters() {
        let (_, command) = parse_from(&["sieve", "query", "dogs", "id=0001", "order_by=name,desc"]);
        match command {
            Some(Commands::Query { table, filters }) => {
                assert_eq!(table, "dogs");
                assert_eq!(filters, vec!["id=0001", "order_by=name,desc"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_export_format() {
        let (_, command) = parse_from(&["sieve", "export", "dogs", "--format", "json", "age=<5"]);
        match command {
            Some(Commands::Export {
                format, output, filters, ..
            }) => {
                assert_eq!(format, ExportFormat::Json);
                assert!(output.is_none());
                assert_eq!(filters, vec!["age=<5"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["sieve", "export", "dogs", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_insert() {
        let (_, command) = parse_from(&["sieve", "insert", "dogs", "--generate-id", "Bolt", "7"]);
        match command {
            Some(Commands::Insert {
                generate_id, values, ..
            }) => {
                assert!(generate_id);
                assert_eq!(values, vec!["Bolt", "7"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
