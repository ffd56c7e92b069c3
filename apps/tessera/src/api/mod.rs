//! # Tessera HTTP API Module
//!
//! One dashboard session served over HTTP with axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /components` - Components visible under the active filters
//! - `GET /state` - Active filters and their query string
//! - `PUT /filters/{id}` - Set a filter
//! - `DELETE /filters/{id}` - Return a filter to its default
//! - `POST /bars/{id}/clear` - Clear one filter bar
//! - `POST /clear` - Clear every filter
//! - `POST /filter` - Filter a posted dashboard (stateless)
//! - `POST /classify` - Classify posted components (stateless)
//!
//! ## Configuration (`[server]` in tessera.toml)
//!
//! - `cors_origins`: allowed origins, `["*"]` for all (default: localhost only)
//! - `rate_limit`: requests per second (default: 100, 0 to disable)

mod handlers;
mod middleware;
mod types;

pub use handlers::ApiError;
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    ClassifiedComponent, ClassifyRequest, ClassifyResponse, ComponentsResponse, ErrorResponse,
    FilterRequest, HealthResponse, SetFilterRequest, StateResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tessera_core::{DashboardSession, TesseraError};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body (2 MB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the one dashboard session.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<DashboardSession>>,
}

impl AppState {
    /// Wrap a session for sharing across handlers.
    #[must_use]
    pub fn new(session: DashboardSession) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `["*"]`: allows all origins
/// - unset or no valid entry: localhost only
/// - otherwise: exactly the listed origins
fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some([only]) if only == "*" => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate limiting (if enabled)
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/components", get(handlers::components_handler))
        .route("/state", get(handlers::state_handler))
        .route(
            "/filters/{id}",
            put(handlers::set_filter_handler).delete(handlers::reset_filter_handler),
        )
        .route("/bars/{id}/clear", post(handlers::clear_bar_handler))
        .route("/clear", post(handlers::clear_all_handler))
        .route("/filter", post(handlers::filter_handler))
        .route("/classify", post(handlers::classify_handler));

    if server.rate_limit > 0 {
        tracing::info!(
            "Rate limiting enabled: {} requests/second",
            server.rate_limit
        );
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(server.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(server.cors_origins.as_deref()))
                .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve `session` until the process is stopped.
pub async fn run_server(
    session: DashboardSession,
    server: &ServerConfig,
) -> Result<(), TesseraError> {
    let router = create_router(AppState::new(session), server);
    let addr = server.addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TesseraError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Tessera HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| TesseraError::IoError(format!("Server error: {}", e)))
}
