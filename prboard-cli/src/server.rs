//! HTTP API for the dashboard front end
//!
//! `GET /prs` serves the background-refreshed grid for the configured query,
//! `POST /prs` builds a grid for the repositories and authors in the request
//! body. Any other path falls through to the static asset directory.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use prboard_core::{Author, Dashboard, Grid, GridRow, RepositoryRef, ReviewStatus};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::warn;

/// Shared state for the axum routes
#[derive(Clone)]
pub struct ServerState {
    pub dashboard: Arc<Dashboard>,
}

/// Build the full router
pub fn router(dashboard: Arc<Dashboard>, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/prs", get(get_prs).post(post_prs))
        .route("/health", get(health))
        .with_state(ServerState { dashboard });

    match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    }
}

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON error body
#[derive(Serialize)]
struct ApiError {
    code: &'static str,
    message: String,
}

/// Error response for the API routes
struct ApiErr {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiError {
                code: self.code,
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<prboard_core::Error> for ApiErr {
    fn from(err: prboard_core::Error) -> Self {
        let (status, code) = match &err {
            prboard_core::Error::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            prboard_core::Error::InvalidRepository(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        if status != StatusCode::BAD_REQUEST {
            warn!(error = %err, "Request failed");
        }
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_INPUT",
            message: rejection.body_text(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_prs(State(state): State<ServerState>) -> Result<Json<Grid>, ApiErr> {
    match state.dashboard.current_grid().await {
        Some(grid) => Ok(Json(Grid::clone(&grid))),
        None => Err(ApiErr {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "NOT_READY",
            message: "Pull requests have not been fetched yet".to_string(),
        }),
    }
}

/// Body of `POST /prs`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GridQuery {
    repos: Vec<String>,
    authors: Vec<Author>,
}

#[derive(Debug, Default, Deserialize)]
struct FormatParams {
    format: Option<String>,
}

/// Grid row carrying the boolean-string fields older front ends read
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LegacyGridRow {
    #[serde(flatten)]
    row: GridRow,
    review_requested: &'static str,
    reviewed: &'static str,
}

impl From<GridRow> for LegacyGridRow {
    fn from(row: GridRow) -> Self {
        let flag = |status: ReviewStatus| {
            if row.review_status == status {
                "true"
            } else {
                "false"
            }
        };
        Self {
            review_requested: flag(ReviewStatus::Requested),
            reviewed: flag(ReviewStatus::Reviewed),
            row,
        }
    }
}

async fn post_prs(
    State(state): State<ServerState>,
    Query(params): Query<FormatParams>,
    payload: Result<Json<GridQuery>, JsonRejection>,
) -> Result<Response, ApiErr> {
    let Json(query) = payload?;
    let repos = query
        .repos
        .iter()
        .map(|r| RepositoryRef::parse(r))
        .collect::<prboard_core::Result<Vec<_>>>()?;

    let grid = state.dashboard.grid_for(&repos, &query.authors).await?;

    let response = match params.format.as_deref() {
        Some("legacy") => {
            let rows: Vec<LegacyGridRow> = grid.into_iter().map(LegacyGridRow::from).collect();
            Json(rows).into_response()
        }
        _ => Json(grid).into_response(),
    };
    Ok(response)
}
