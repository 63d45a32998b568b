//! HTTP API
//!
//! Thin JSON mapping over the indexer and the query engine.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/startIndexing` | Start a full rebuild of every configured site |
//! | `GET`  | `/api/stopIndexing` | Stop the running rebuild |
//! | `POST` | `/api/indexPage?url=` | Re-index a single page |
//! | `GET`  | `/api/search?query=&site=&offset=&limit=` | Ranked search |
//! | `GET`  | `/api/statistics` | Totals and per-site status |
//!
//! Every response is `{ "result": bool, "error"?, "count"?, "data"? }`.
//! Caller mistakes are answered with 200 and `result: false`, storage
//! failures with 500.

use crate::error::{Error, Result};
use crate::indexer::{Indexer, RescanOutcome, Statistics};
use crate::search::{QueryEngine, SearchOptions, SearchResult};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state of the route handlers
#[derive(Clone)]
pub struct AppState {
    pub indexer: Arc<Indexer>,
    pub engine: QueryEngine,
}

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok() -> Self {
        Self {
            result: true,
            error: None,
            count: None,
            data: None,
        }
    }

    fn with_data(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(message.into()),
            ..Self::ok()
        }
    }
}

/// Error converted into an HTTP response
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        if err.is_validation() {
            Self {
                status: StatusCode::OK,
                message: err.to_string(),
            }
        } else {
            warn!("Request failed: {}", err);
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::failure(self.message))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, AppError>;

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/startIndexing", get(start_indexing))
        .route("/api/stopIndexing", get(stop_indexing))
        .route("/api/indexPage", post(index_page))
        .route("/api/search", get(search))
        .route("/api/statistics", get(statistics))
        .with_state(state)
}

/// Serve the API on `bind` until the process ends
pub async fn run_server(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn start_indexing(State(state): State<AppState>) -> ApiResult<()> {
    state.indexer.start()?;
    Ok(Json(ApiResponse::ok()))
}

async fn stop_indexing(State(state): State<AppState>) -> ApiResult<()> {
    state.indexer.stop()?;
    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
struct IndexPageParams {
    #[serde(default)]
    url: String,
}

async fn index_page(
    State(state): State<AppState>,
    Query(params): Query<IndexPageParams>,
) -> ApiResult<()> {
    let response = match state.indexer.rescan_page(&params.url).await? {
        RescanOutcome::Indexed { .. } => ApiResponse::ok(),
        RescanOutcome::SiteNotIndexed => {
            ApiResponse::failure("The site of this page has not been indexed yet")
        }
        RescanOutcome::FetchFailed { error } => {
            ApiResponse::failure(format!("Page could not be fetched: {}", error))
        }
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    site: Option<String>,
    offset: Option<usize>,
    limit: Option<usize>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<SearchResult>> {
    let options = SearchOptions {
        site: params.site.filter(|s| !s.trim().is_empty()),
        offset: params.offset.unwrap_or(0),
        limit: params.limit,
    };
    let found = state.engine.search(&params.query, &options).await?;
    Ok(Json(ApiResponse {
        count: Some(found.count),
        ..ApiResponse::with_data(found.results)
    }))
}

async fn statistics(State(state): State<AppState>) -> ApiResult<Statistics> {
    let stats = state.indexer.statistics().await?;
    Ok(Json(ApiResponse::with_data(stats)))
}
