//! Observer API: context snapshot reads and sensor intake.

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::observer::{NewObservation, SensorPatch};
use crate::types::ActivityType;

/// Sensor POST body. `active_window` / `screen_context` follow the
/// partial-update contract: null means "do not overwrite".
#[derive(Debug, Deserialize)]
pub struct SensorContextRequest {
    pub active_window: Option<String>,
    pub screen_context: Option<String>,
    /// Structured observation; omitted for window-only pings. Kept as raw
    /// JSON so a malformed observation doesn't reject the whole post.
    pub observation: Option<Value>,
    /// Unix seconds of the app switch, used as the observation timestamp.
    pub switch_timestamp: Option<i64>,
}

/// Inner observation payload.
#[derive(Debug, Deserialize)]
struct SensorObservation {
    app: String,
    #[serde(default)]
    window_title: String,
    #[serde(default)]
    activity: Option<String>,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<Vec<String>>,
    #[serde(default)]
    blocked: bool,
}

/// Return the current context snapshot.
pub async fn get_state(State(state): State<AppState>) -> Response {
    Json(state.context.get().as_ref()).into_response()
}

/// Receive a partial context update (and optionally an observation) from
/// the sensor.
///
/// Malformed inner observations are logged and discarded; the outer post
/// is still acknowledged so the heartbeat survives sensor bugs.
pub async fn post_sensor_context(
    State(state): State<AppState>,
    Json(body): Json<SensorContextRequest>,
) -> Response {
    if let Some(raw) = body.observation {
        match serde_json::from_value::<SensorObservation>(raw) {
            Ok(obs) => {
                let timestamp = body
                    .switch_timestamp
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                let new = NewObservation {
                    app_name: obs.app,
                    window_title: obs.window_title,
                    activity_type: obs
                        .activity
                        .as_deref()
                        .and_then(|a| a.parse().ok())
                        .unwrap_or(ActivityType::Other),
                    project: obs.project,
                    summary: obs.summary,
                    details: obs.details,
                    blocked: obs.blocked,
                    timestamp,
                };
                if let Err(e) = state.screen.create(new).await {
                    tracing::error!(error = %e, "Failed to persist screen observation");
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Discarding malformed sensor observation");
            }
        }
    }

    state
        .context
        .apply_sensor_patch(&SensorPatch {
            active_window: body.active_window,
            screen_context: body.screen_context,
        })
        .await;

    Json(serde_json::json!({ "status": "ok" })).into_response()
}

/// Sensor connectivity, derived from the heartbeat timestamp.
pub async fn daemon_status(State(state): State<AppState>) -> Response {
    let ctx = state.context.get();
    let now = Utc::now();
    Json(serde_json::json!({
        "connected": ctx.sensor_connected(now),
        "last_post": ctx.last_sensor_post,
        "active_window": ctx.active_window,
        "has_screen_context": ctx.screen_context.is_some(),
    }))
    .into_response()
}

/// Debug endpoint: force a full context refresh.
pub async fn post_refresh(State(state): State<AppState>) -> Response {
    let snapshot = state.context.refresh().await;
    Json(snapshot.as_ref()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::broadcast::Broadcaster;
    use crate::config::Settings;
    use crate::observer::ContextManager;
    use crate::observer::ScreenObservationRepository;
    use crate::profile::UserProfileRepository;

    async fn test_state() -> AppState {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        AppState {
            context: Arc::new(ContextManager::new(Settings::default(), Vec::new(), tx)),
            screen: ScreenObservationRepository::new(pool.clone()),
            profile: UserProfileRepository::new(pool),
            broadcaster: Arc::new(Broadcaster::new()),
        }
    }

    fn post(body: serde_json::Value) -> SensorContextRequest {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_partial_updates_merge() {
        let state = test_state().await;

        post_sensor_context(
            State(state.clone()),
            Json(post(serde_json::json!({
                "active_window": "VS Code",
                "screen_context": "A"
            }))),
        )
        .await;
        post_sensor_context(
            State(state.clone()),
            Json(post(serde_json::json!({
                "active_window": null,
                "screen_context": "B"
            }))),
        )
        .await;
        post_sensor_context(
            State(state.clone()),
            Json(post(serde_json::json!({
                "active_window": "Terminal",
                "screen_context": null
            }))),
        )
        .await;

        let ctx = state.context.get();
        assert_eq!(ctx.active_window.as_deref(), Some("Terminal"));
        assert_eq!(ctx.screen_context.as_deref(), Some("B"));
        assert!(ctx.last_sensor_post.is_some());
    }

    #[tokio::test]
    async fn test_both_null_is_heartbeat() {
        let state = test_state().await;
        post_sensor_context(
            State(state.clone()),
            Json(post(serde_json::json!({
                "active_window": null,
                "screen_context": null
            }))),
        )
        .await;

        let ctx = state.context.get();
        assert!(ctx.active_window.is_none());
        assert!(ctx.last_sensor_post.is_some());
    }

    #[tokio::test]
    async fn test_observation_persisted_with_switch_timestamp() {
        let state = test_state().await;
        let switch_ts = Utc::now().timestamp() - 120;

        post_sensor_context(
            State(state.clone()),
            Json(post(serde_json::json!({
                "active_window": "VS Code",
                "screen_context": null,
                "observation": {
                    "app": "VS Code",
                    "window_title": "main.rs",
                    "activity": "coding",
                    "project": "aegis",
                    "blocked": false
                },
                "switch_timestamp": switch_ts
            }))),
        )
        .await;

        let day = Utc::now().date_naive();
        let summary = state.screen.daily_summary(day).await.unwrap();
        assert_eq!(summary.total_observations, 1);
        assert_eq!(summary.by_app[0].0, "VS Code");
    }

    #[tokio::test]
    async fn test_malformed_observation_still_acknowledged() {
        let state = test_state().await;

        let response = post_sensor_context(
            State(state.clone()),
            Json(post(serde_json::json!({
                "active_window": "VS Code",
                "screen_context": null,
                "observation": {"bogus": true}
            }))),
        )
        .await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        // The patch still applied even though the observation was junk.
        assert_eq!(state.context.get().active_window.as_deref(), Some("VS Code"));
        let day = Utc::now().date_naive();
        let summary = state.screen.daily_summary(day).await.unwrap();
        assert_eq!(summary.total_observations, 0);
    }

    #[tokio::test]
    async fn test_unknown_activity_maps_to_other() {
        let state = test_state().await;
        post_sensor_context(
            State(state.clone()),
            Json(post(serde_json::json!({
                "observation": {
                    "app": "Weird",
                    "activity": "juggling",
                    "blocked": false
                }
            }))),
        )
        .await;

        let day = Utc::now().date_naive();
        let summary = state.screen.daily_summary(day).await.unwrap();
        assert_eq!(summary.by_activity[0].0, "other");
    }
}
