//! Core application

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::{SqliteStore, Store};
use crate::domain::export::ExportFormat;
use crate::domain::query::RawRequest;
use crate::domain::{CountResponse, Dataset, list_datasets};

pub struct CoreApp {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub shutdown: ShutdownService,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(AppConfig::load(&cli_config)?);

        match command {
            Some(Commands::Serve) | None => app.serve().await,
            Some(Commands::Datasets) => app.print_datasets().await,
            Some(Commands::Fields { table }) => {
                let dataset = app.dataset(&table).await?;
                for field in dataset.fields().await? {
                    println!("{}", field);
                }
                Ok(())
            }
            Some(Commands::Query { table, filters }) => {
                let dataset = app.dataset(&table).await?;
                let response = dataset.json(&parse_filters(&filters)?).await;
                print_json(&response)
            }
            Some(Commands::Count { table, filters }) => {
                let dataset = app.dataset(&table).await?;
                let response = match dataset.count(&parse_filters(&filters)?).await {
                    Ok(total) => CountResponse::from(total),
                    Err(e) => CountResponse::failure(&e),
                };
                print_json(&response)
            }
            Some(Commands::Export {
                table,
                format,
                output,
                filters,
            }) => app.export(&table, format, output, &filters).await,
            Some(Commands::Insert {
                table,
                generate_id,
                values,
            }) => {
                let dataset = app.dataset(&table).await?;
                match dataset.create(values, generate_id).await? {
                    Some(id) => println!("{}", id),
                    None => println!("Inserted 1 row into {}", table),
                }
                Ok(())
            }
        }
    }

    fn init(config: AppConfig) -> Self {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&config.database.path));
        Self {
            config,
            store,
            shutdown: ShutdownService::new(),
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    async fn dataset(&self, table: &str) -> Result<Dataset> {
        Dataset::open(self.store.clone(), table, self.config.query.clone())
            .await
            .with_context(|| format!("Cannot open dataset '{}'", table))
    }

    async fn print_datasets(&self) -> Result<()> {
        let datasets = list_datasets(self.store.as_ref(), self.config.query.dataset_name_length).await?;
        for name in datasets {
            println!("{}", name);
        }
        Ok(())
    }

    async fn export(
        &self,
        table: &str,
        format: ExportFormat,
        output: Option<PathBuf>,
        filters: &[String],
    ) -> Result<()> {
        let dataset = self.dataset(table).await?;
        let path = dataset
            .export(
                &parse_filters(filters)?,
                format,
                output.as_deref(),
                &self.config.export,
            )
            .await?;
        println!("{}", path.display());
        Ok(())
    }

    async fn serve(self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        self.shutdown.install_signal_handlers();

        banner::print_banner(
            &self.config.server.host,
            self.config.server.port,
            &self.config.database.path,
        );

        let server = ApiServer::new(self);
        server.start().await?;
        Ok(())
    }
}

fn parse_filters(pairs: &[String]) -> Result<RawRequest> {
    RawRequest::from_pairs(pairs).map_err(anyhow::Error::msg)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
