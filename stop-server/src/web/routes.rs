//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use futures::future::join_all;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::diagnostics::{self, Diagnostics};
use crate::domain::StopId;
use crate::error::ErrorChain;
use crate::poller::{RefreshOutcome, UpdateFailed};
use crate::registry::{RegistryError, StopEntry};
use crate::setup::SetupError;
use crate::upstream::StopSource;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
pub fn create_router<S: StopSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(index_page::<S>))
        .route("/health", get(health))
        .route("/stops", get(list_stops::<S>).post(add_stop::<S>))
        .route("/stops/:stop_id", get(get_stop::<S>).delete(remove_stop::<S>))
        .route("/stops/:stop_id/refresh", post(refresh_stop::<S>))
        .route("/stops/:stop_id/diagnostics", get(stop_diagnostics::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

async fn summaries<S: StopSource>(state: &AppState<S>) -> Vec<StopSummary> {
    let entries = state.registry.list().await;
    join_all(entries.iter().map(|entry| StopSummary::from_entry(entry))).await
}

/// Index page listing configured stops.
async fn index_page<S: StopSource>(State(state): State<AppState<S>>) -> Result<Response, AppError> {
    let stops = summaries(&state).await.iter().map(StopRow::from_summary).collect();

    let html = IndexTemplate { stops }.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;

    Ok(Html(html).into_response())
}

/// List configured stops.
async fn list_stops<S: StopSource>(State(state): State<AppState<S>>) -> Json<StopListResponse> {
    Json(StopListResponse {
        stops: summaries(&state).await,
    })
}

/// Configure a new stop.
async fn add_stop<S: StopSource>(
    State(state): State<AppState<S>>,
    Json(req): Json<AddStopRequest>,
) -> Result<Response, AppError> {
    let entry = state.registry.configure(&req).await?;
    let view = StopView::from_entry(&entry).await;

    Ok((StatusCode::CREATED, Json(view)).into_response())
}

/// Look up a configured stop by the id in the path.
async fn find_entry<S: StopSource>(
    state: &AppState<S>,
    stop_id: &str,
) -> Result<std::sync::Arc<StopEntry<S>>, AppError> {
    let not_found = || AppError::NotFound {
        message: format!("Stop {} is not configured", stop_id),
    };

    let stop_id = StopId::parse(stop_id).map_err(|_| not_found())?;
    state.registry.get(&stop_id).await.ok_or_else(not_found)
}

/// Current wait times at a stop.
async fn get_stop<S: StopSource>(
    State(state): State<AppState<S>>,
    Path(stop_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let entry = find_entry(&state, &stop_id).await?;
    let view = StopView::from_entry(&entry).await;

    // Return HTML or JSON based on Accept header
    if accepts_html(&headers) {
        let html = StopTemplate::from_view(&view)
            .render()
            .map_err(|e| AppError::Internal {
                message: format!("Template error: {}", e),
            })?;

        Ok(Html(html).into_response())
    } else {
        Ok(Json(view).into_response())
    }
}

/// Poll a stop now.
async fn refresh_stop<S: StopSource>(
    State(state): State<AppState<S>>,
    Path(stop_id): Path<String>,
) -> Result<Json<RefreshResponse>, AppError> {
    let entry = find_entry(&state, &stop_id).await?;

    let outcome = match entry.poller.refresh().await? {
        RefreshOutcome::Updated(_) => "updated",
        RefreshOutcome::Skipped => "skipped",
    };

    Ok(Json(RefreshResponse {
        stop_id: entry.stop_id.clone(),
        outcome,
    }))
}

/// Stop polling a stop.
async fn remove_stop<S: StopSource>(
    State(state): State<AppState<S>>,
    Path(stop_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let entry = find_entry(&state, &stop_id).await?;

    if state.registry.unload(&entry.stop_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        // Removed concurrently.
        Err(AppError::NotFound {
            message: format!("Stop {} is not configured", stop_id),
        })
    }
}

/// Diagnostics dump for a stop.
async fn stop_diagnostics<S: StopSource>(
    State(state): State<AppState<S>>,
    Path(stop_id): Path<String>,
) -> Result<Json<Diagnostics>, AppError> {
    let entry = find_entry(&state, &stop_id).await?;
    Ok(Json(diagnostics::collect(&entry).await))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String, code: &'static str },
    NotFound { message: String },
    Unavailable { message: String },
    Internal { message: String },
}

impl From<SetupError> for AppError {
    fn from(e: SetupError) -> Self {
        match e {
            SetupError::Unknown(_) => AppError::Internal {
                message: ErrorChain(&e).to_string(),
            },
            _ => AppError::BadRequest {
                code: e.code(),
                message: ErrorChain(&e).to_string(),
            },
        }
    }
}

impl From<UpdateFailed> for AppError {
    fn from(e: UpdateFailed) -> Self {
        AppError::Unavailable {
            message: ErrorChain(&e).to_string(),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Setup(e) => e.into(),
            RegistryError::NotReady(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            AppError::BadRequest { message, code } => (StatusCode::BAD_REQUEST, code, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, "not_found", message),
            AppError::Unavailable { message } => {
                (StatusCode::SERVICE_UNAVAILABLE, "not_ready", message)
            }
            AppError::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "unknown", message)
            }
        };

        if status.is_server_error() {
            error!(status = %status, code, "{message}");
        } else {
            warn!(status = %status, code, "{message}");
        }

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });
        (status, body).into_response()
    }
}
