use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use rolodex_service::{
	Error as ServiceError, FuzzyRequest, FuzzyResponse, LookupRequest, LookupResponse,
	REBUILD_SECRET_HEADER, RecordEntityRequest, RecordEntityResponse, RemoveEntityRequest,
	RemoveEntityResponse, SearchRequest, SearchResponse, TraverseRequest, TraverseResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/entities/record", post(record))
		.route("/v1/entities/delete", post(remove))
		.route("/v1/query/lookup", post(lookup))
		.route("/v1/query/fuzzy", post(fuzzy))
		.route("/v1/query/search", post(search))
		.route("/v1/query/traverse", post(traverse))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/rebuild", post(rebuild))
		.route("/v1/admin/rebuild_state", get(rebuild_state))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn record(
	State(state): State<AppState>,
	Json(payload): Json<RecordEntityRequest>,
) -> Result<Json<RecordEntityResponse>, ApiError> {
	let response = state.service.record(payload).await?;
	Ok(Json(response))
}

async fn remove(
	State(state): State<AppState>,
	Json(payload): Json<RemoveEntityRequest>,
) -> Result<Json<RemoveEntityResponse>, ApiError> {
	let response = state.service.remove(payload).await?;
	Ok(Json(response))
}

async fn lookup(
	State(state): State<AppState>,
	Json(payload): Json<LookupRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
	let response = state.service.lookup(payload).await?;
	Ok(Json(response))
}

async fn fuzzy(
	State(state): State<AppState>,
	Json(payload): Json<FuzzyRequest>,
) -> Result<Json<FuzzyResponse>, ApiError> {
	let response = state.service.fuzzy(payload).await?;
	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;
	Ok(Json(response))
}

async fn traverse(
	State(state): State<AppState>,
	Json(payload): Json<TraverseRequest>,
) -> Result<Json<TraverseResponse>, ApiError> {
	let response = state.service.traverse(payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct RebuildBody {
	#[serde(default)]
	scope_id: Option<String>,
	#[serde(default)]
	triggered_by: Option<String>,
}

#[derive(Debug, Serialize)]
struct RebuildAccepted {
	status: &'static str,
}

/// Fire-and-forget rebuild trigger: authenticates the process-local shared
/// secret, dispatches the executor on a background task, and answers 202
/// without waiting.
async fn rebuild(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<RebuildBody>,
) -> Result<(StatusCode, Json<RebuildAccepted>), ApiError> {
	let presented = headers
		.get(REBUILD_SECRET_HEADER)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default();

	if presented != state.service.cfg.security.rebuild_secret {
		return Err(ApiError::new(
			StatusCode::UNAUTHORIZED,
			"unauthorized",
			"Invalid rebuild secret.",
		));
	}

	let service = state.service.clone();
	let scope_id = payload.scope_id;
	let triggered_by = payload.triggered_by.unwrap_or_else(|| "admin".to_string());

	tokio::spawn(async move {
		if let Err(err) = service.rebuild(scope_id, &triggered_by).await {
			tracing::error!(error = %err, "Admin-triggered rebuild failed.");
		}
	});

	Ok((StatusCode::ACCEPTED, Json(RebuildAccepted { status: "accepted" })))
}

async fn rebuild_state(
	State(state): State<AppState>,
) -> Json<rolodex_domain::RebuildState> {
	Json(state.service.rebuild_state())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match &err {
			ServiceError::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", err.to_string()),
			ServiceError::NotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "not_found", err.to_string()),
			ServiceError::Conflict { .. } =>
				Self::new(StatusCode::CONFLICT, "conflict", err.to_string()),
			ServiceError::Projection { .. } =>
				Self::new(StatusCode::UNPROCESSABLE_ENTITY, "projection_failed", err.to_string()),
			ServiceError::Storage { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", err.to_string()),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
