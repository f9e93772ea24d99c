//! API server initialization

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::{datasets, health};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Build the full router with all layers applied
    pub fn router(&self) -> Router {
        let datasets_routes = datasets::routes(self.app.store.clone(), self.app.config.query.clone());

        Router::new()
            .route("/api/v1/health", get(health::health))
            .nest("/api/v1/datasets", datasets_routes)
            .fallback(middleware::handle_404)
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(middleware::cors(&self.allowed_origins))
            .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
    }

    /// Serve until shutdown is triggered. Returns CoreApp once drained.
    pub async fn start(self) -> Result<CoreApp> {
        let router = self.router();
        let shutdown = self.app.shutdown.clone();

        let host = &self.app.config.server.host;
        let port = self.app.config.server.port;
        let addr = SocketAddr::new(
            host.parse()
                .with_context(|| format!("Invalid server host '{}'", host))?,
            port,
        );

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!(%addr, "Listening");

        let mut server = tokio::spawn(
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown.wait())
                .into_future(),
        );

        tokio::select! {
            result = &mut server => {
                result.context("Server task failed")?.context("Server error")?;
                return Ok(self.app);
            }
            _ = shutdown.wait() => {}
        }

        if let Some(result) = shutdown.drain(server).await {
            result.context("Server error")?;
        }

        Ok(self.app)
    }
}
