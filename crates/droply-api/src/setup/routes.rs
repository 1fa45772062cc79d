//! Route configuration and middleware layering.

use crate::handlers;
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use droply_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

const HTTP_CONCURRENCY_LIMIT: usize = 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));
    rate_limiter.clone().start_sweeper();

    let app = Router::new()
        // Uploads (authenticated)
        .route("/api/upload/create", post(handlers::upload::create_upload))
        .route(
            "/api/upload/complete",
            post(handlers::upload::complete_upload),
        )
        // Transfers (authenticated)
        .route(
            "/api/transfers/create",
            post(handlers::transfer::create_transfer),
        )
        .route("/api/transfers", get(handlers::transfer::list_transfers))
        .route(
            "/api/transfers/{id}/stats",
            get(handlers::transfer::transfer_stats),
        )
        .route(
            "/api/transfers/{id}/delete",
            delete(handlers::transfer::delete_transfer),
        )
        .route(
            "/api/transfers/{id}/notify",
            post(handlers::notify::notify_recipients),
        )
        // Public share surface
        .route("/api/share/{slug}", get(handlers::share::share_view))
        .route(
            "/api/share/{slug}/download",
            get(handlers::share::download),
        )
        // Cleanup triggers (cron-secret guarded)
        .route("/api/admin/cleanup", post(handlers::cleanup::admin_cleanup))
        .route("/api/cron/cleanup", post(handlers::cleanup::cron_cleanup))
        // Email engagement tracking
        .route(
            "/api/email/track/open/{recipient_id}",
            get(handlers::track::track_open),
        )
        .route(
            "/api/email/track/click/{recipient_id}",
            post(handlers::track::track_click),
        )
        // Docs and health
        .route("/api/openapi.json", get(openapi_json))
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .with_state(state);

    Ok(app)
}

async fn openapi_json() -> impl IntoResponse {
    Json(crate::api_doc::ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    if config.cors_origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any))
}
