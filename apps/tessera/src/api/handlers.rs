//! # API Endpoint Handlers
//!
//! Session endpoints take the read lock to look and the write lock to
//! change filters. `/filter` and `/classify` never touch the session state.

use super::{
    AppState,
    types::{
        ClassifiedComponent, ClassifyRequest, ClassifyResponse, ComponentsResponse, ErrorResponse,
        FilterRequest, HealthResponse, SetFilterRequest, StateResponse,
    },
};
use crate::observer::TracingObserver;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tessera_core::{
    DashboardConfig, FilterDefinition, FilterResult, FilterType, FilterValue, TesseraError,
    classify, decode_value,
};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// A core error on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TesseraError);

impl From<TesseraError> for ApiError {
    fn from(e: TesseraError) -> Self {
        Self(e)
    }
}

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.0 {
            TesseraError::UnknownFilter(_) | TesseraError::UnknownFilterBar(_) => {
                StatusCode::NOT_FOUND
            }
            TesseraError::InvalidComponent(_)
            | TesseraError::ConfigError(_)
            | TesseraError::SerializationError(_) => StatusCode::BAD_REQUEST,
            TesseraError::StorageError(_) | TesseraError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// SESSION VIEWS
// =============================================================================

/// Components that pass the active filters.
pub async fn components_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(ComponentsResponse::from_session(&session))
}

/// Active filters and their query string.
pub async fn state_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(StateResponse::from_session(&session))
}

// =============================================================================
// FILTER UPDATES
// =============================================================================

/// Set one filter.
pub async fn set_filter_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetFilterRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let mut session = state.session.write().await;
    let value = {
        let def = session
            .definitions()
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| TesseraError::UnknownFilter(id.clone()))?;
        read_value(def, request.value)
    };
    session.set_filter(&id, value)?;
    tracing::info!(filter = %id, "filter set");
    Ok(Json(StateResponse::from_session(&session)))
}

/// Strings are the query-string form, except for search filters whose
/// value is the string itself.
fn read_value(def: &FilterDefinition, value: FilterValue) -> FilterValue {
    match value {
        FilterValue::Text(raw) if def.kind != FilterType::Search => decode_value(def, &raw),
        other => other,
    }
}

/// Return one filter to its default.
pub async fn reset_filter_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let mut session = state.session.write().await;
    session.reset_filter(&id)?;
    tracing::info!(filter = %id, "filter reset");
    Ok(Json(StateResponse::from_session(&session)))
}

/// Return every filter of one bar to its default.
pub async fn clear_bar_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let mut session = state.session.write().await;
    session.clear_bar(&id)?;
    tracing::info!(bar = %id, "filter bar cleared");
    Ok(Json(StateResponse::from_session(&session)))
}

/// Return every filter to its default.
pub async fn clear_all_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.write().await;
    session.clear_all();
    tracing::info!("all filters cleared");
    Json(StateResponse::from_session(&session))
}

// =============================================================================
// STATELESS ENDPOINTS
// =============================================================================

/// Filter a posted dashboard with the server's engine options.
pub async fn filter_handler(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<FilterResult>, ApiError> {
    let engine = *state.session.read().await.engine();
    let dashboard = DashboardConfig::from_value(request.dashboard)?;
    let definitions: Vec<FilterDefinition> = dashboard.definitions().cloned().collect();

    let result = engine.apply_observed(
        &dashboard.components,
        &definitions,
        &request.state,
        &TracingObserver,
    );
    Ok(Json(result))
}

/// Classify posted components.
pub async fn classify_handler(Json(request): Json<ClassifyRequest>) -> impl IntoResponse {
    let components = request
        .components
        .iter()
        .map(|c| {
            let classification = classify(c);
            ClassifiedComponent {
                id: c.id().to_string(),
                role: classification.role(),
                classification,
            }
        })
        .collect();
    (StatusCode::OK, Json(ClassifyResponse { components }))
}
