use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::runtime::{AppHandle, HandleError};
use crate::snapshot::Snapshot;
use crate::terms::TermError;

#[derive(Clone)]
pub struct AppState {
    pub handle: AppHandle,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/snapshot", get(snapshot))
        .route("/terms", get(list_terms).post(add_term))
        .route("/terms/{term}", delete(remove_term))
        .route("/start", post(start))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AddTermReq {
    term: String,
}

#[derive(serde::Deserialize)]
struct StartReq {
    /// Comma-separated terms.
    input: String,
}

#[derive(serde::Serialize)]
struct TermsResp {
    terms: Vec<String>,
}

#[derive(serde::Serialize)]
struct RemoveResp {
    removed: bool,
    terms: Vec<String>,
}

#[derive(serde::Serialize)]
struct ErrorResp {
    error: String,
}

/// Maps controller errors onto HTTP statuses.
struct ApiError(HandleError);

impl From<HandleError> for ApiError {
    fn from(e: HandleError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HandleError::Term(TermError::Empty) => StatusCode::BAD_REQUEST,
            HandleError::Term(TermError::AlreadyStarted) => StatusCode::CONFLICT,
            HandleError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
        };
        tracing::debug!(target: "api", %status, error = %self.0, "request rejected");
        (
            status,
            Json(ErrorResp {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

async fn snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.handle.snapshot())
}

async fn list_terms(State(state): State<AppState>) -> Json<TermsResp> {
    Json(TermsResp {
        terms: state.handle.snapshot().terms,
    })
}

async fn add_term(
    State(state): State<AppState>,
    Json(body): Json<AddTermReq>,
) -> Result<Json<TermsResp>, ApiError> {
    let terms = state.handle.add_term(body.term).await?;
    Ok(Json(TermsResp { terms }))
}

async fn remove_term(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<RemoveResp>, ApiError> {
    let (removed, terms) = state.handle.remove_term(term).await?;
    Ok(Json(RemoveResp { removed, terms }))
}

async fn start(
    State(state): State<AppState>,
    Json(body): Json<StartReq>,
) -> Result<Json<TermsResp>, ApiError> {
    let terms = state.handle.start(body.input).await?;
    Ok(Json(TermsResp { terms }))
}
