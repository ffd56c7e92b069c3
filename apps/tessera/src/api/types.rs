//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use serde::{Deserialize, Serialize};
use tessera_core::{
    ActiveFilterState, Classification, ComponentDescriptor, ComponentRole, DashboardSession,
    Exclusion, FilterValue,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// SESSION VIEWS
// =============================================================================

/// Components visible under the session's filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsResponse {
    pub components: Vec<ComponentDescriptor>,
    pub exclusions: Vec<Exclusion>,
    pub total: usize,
}

impl ComponentsResponse {
    /// Snapshot the visible list of a session.
    #[must_use]
    pub fn from_session(session: &DashboardSession) -> Self {
        Self {
            components: session.visible().to_vec(),
            exclusions: session.exclusions().to_vec(),
            total: session.components().len(),
        }
    }
}

/// Active filters plus their URL form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    pub active: ActiveFilterState,
    pub query: String,
    pub visible: usize,
    pub total: usize,
}

impl StateResponse {
    /// Snapshot the filter state of a session.
    #[must_use]
    pub fn from_session(session: &DashboardSession) -> Self {
        Self {
            active: session.state().clone(),
            query: session.query_string(),
            visible: session.visible().len(),
            total: session.components().len(),
        }
    }
}

// =============================================================================
// FILTER UPDATES
// =============================================================================

/// Body of `PUT /filters/{id}`.
///
/// A string value is read in query-string form for the filter's type, so
/// `"100,150"` sets a range slider and `"north,south"` a dropdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFilterRequest {
    pub value: FilterValue,
}

// =============================================================================
// STATELESS ENDPOINTS
// =============================================================================

/// Body of `POST /filter`: a dashboard document and a state to apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRequest {
    /// Dashboard JSON (`components` plus `filters` or `filterBars`).
    pub dashboard: serde_json::Value,
    #[serde(default)]
    pub state: ActiveFilterState,
}

/// Body of `POST /classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub components: Vec<ComponentDescriptor>,
}

/// One classified component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedComponent {
    pub id: String,
    pub role: ComponentRole,
    #[serde(flatten)]
    pub classification: Classification,
}

/// Response of `POST /classify`, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub components: Vec<ClassifiedComponent>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
