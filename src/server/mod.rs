//! HTTP server: sensor intake, settings, activity summaries, and the
//! WebSocket subscriber endpoint.

mod activity_api;
mod observer_api;
mod settings_api;
mod ws;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::broadcast::Broadcaster;
use crate::error::{Error, Result};
use crate::observer::{ContextManager, ScreenObservationRepository};
use crate::profile::UserProfileRepository;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ContextManager>,
    pub screen: ScreenObservationRepository,
    pub profile: UserProfileRepository,
    pub broadcaster: Arc<Broadcaster>,
}

/// Run the HTTP server until the listener fails or the task is cancelled.
pub async fn run(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router; exposed separately so tests can drive it in-process.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Observer / sensor API
        .route("/api/observer/state", get(observer_api::get_state))
        .route("/api/observer/context", post(observer_api::post_sensor_context))
        .route("/api/observer/daemon-status", get(observer_api::daemon_status))
        .route("/api/observer/refresh", post(observer_api::post_refresh))
        // Settings
        .route(
            "/api/settings/interruption-mode",
            get(settings_api::get_interruption_mode).put(settings_api::put_interruption_mode),
        )
        .route(
            "/api/settings/capture-mode",
            get(settings_api::get_capture_mode).put(settings_api::put_capture_mode),
        )
        // Activity summaries
        .route("/api/activity/daily", get(activity_api::daily))
        .route("/api/activity/weekly", get(activity_api::weekly))
        // Broadcast subscribers
        .route("/ws", get(ws::upgrade))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Helper to convert Result to Response with proper status code
pub(crate) fn api_response<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Helper to convert Error to Response with appropriate status code
pub(crate) fn error_response(error: Error) -> Response {
    let (status, message) = match &error {
        Error::NotFound(_) => (StatusCode::NOT_FOUND, error.to_string()),
        Error::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, error.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
