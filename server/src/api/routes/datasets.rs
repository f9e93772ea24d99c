//! Dataset API endpoints
//!
//! The query string of a select or count is the raw request: reserved
//! options (`fields`, `limit`, `order_by`, `group_by`) plus one filter per
//! remaining key.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::types::{ApiError, failure_status};
use crate::core::config::QueryConfig;
use crate::data::traits::Store;
use crate::domain::query::RawRequest;
use crate::domain::{CountResponse, Dataset, QueryResponse, list_datasets};

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct DatasetsApiState {
    pub store: Arc<dyn Store>,
    pub query: QueryConfig,
}

impl DatasetsApiState {
    async fn open(&self, table: &str) -> Result<Dataset, ApiError> {
        Dataset::open(self.store.clone(), table, self.query.clone())
            .await
            .map_err(ApiError::from)
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DatasetsResponse {
    pub datasets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRowRequest {
    pub values: Vec<String>,
    #[serde(default)]
    pub generate_id: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateRowResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

/// Build dataset API routes
pub fn routes(store: Arc<dyn Store>, query: QueryConfig) -> Router<()> {
    let state = DatasetsApiState { store, query };

    Router::new()
        .route("/", get(list))
        .route("/{table}", get(select).post(create))
        .route("/{table}/fields", get(fields))
        .route("/{table}/count", get(count))
        .with_state(state)
}

async fn list(State(state): State<DatasetsApiState>) -> Result<Json<DatasetsResponse>, ApiError> {
    let datasets = list_datasets(state.store.as_ref(), state.query.dataset_name_length)
        .await
        .map_err(ApiError::from_store)?;
    Ok(Json(DatasetsResponse { datasets }))
}

async fn fields(
    State(state): State<DatasetsApiState>,
    Path(table): Path<String>,
) -> Result<Json<FieldsResponse>, ApiError> {
    let dataset = state.open(&table).await?;
    let fields = dataset.fields().await?;
    Ok(Json(FieldsResponse { fields }))
}

async fn select(
    State(state): State<DatasetsApiState>,
    Path(table): Path<String>,
    Query(raw): Query<RawRequest>,
) -> Result<Response, ApiError> {
    let dataset = state.open(&table).await?;
    let response = match dataset.query(&raw).await {
        Ok(result) => (StatusCode::OK, Json(QueryResponse::from(result))).into_response(),
        Err(e) => (failure_status(&e), Json(QueryResponse::failure(&e))).into_response(),
    };
    Ok(response)
}

async fn count(
    State(state): State<DatasetsApiState>,
    Path(table): Path<String>,
    Query(raw): Query<RawRequest>,
) -> Result<Response, ApiError> {
    let dataset = state.open(&table).await?;
    let response = match dataset.count(&raw).await {
        Ok(total) => (StatusCode::OK, Json(CountResponse::from(total))).into_response(),
        Err(e) => (failure_status(&e), Json(CountResponse::failure(&e))).into_response(),
    };
    Ok(response)
}

async fn create(
    State(state): State<DatasetsApiState>,
    Path(table): Path<String>,
    Json(request): Json<CreateRowRequest>,
) -> Result<(StatusCode, Json<CreateRowResponse>), ApiError> {
    let dataset = state.open(&table).await?;
    let id = dataset.create(request.values, request.generate_id).await?;
    tracing::debug!(%table, generated_id = ?id, "Row created");
    Ok((StatusCode::CREATED, Json(CreateRowResponse { success: true, id })))
}
