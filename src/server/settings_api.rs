//! Settings API: interruption mode and capture mode.

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::{error_response, AppState};
use crate::error::Error;
use crate::types::{CaptureMode, InterruptionMode};

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

fn interruption_mode_payload(state: &AppState) -> serde_json::Value {
    let ctx = state.context.get();
    serde_json::json!({
        "mode": ctx.interruption_mode,
        "attention_budget_remaining": ctx.attention_budget_remaining,
        "user_state": ctx.user_state,
    })
}

/// Current interruption mode, budget, and user state.
pub async fn get_interruption_mode(State(state): State<AppState>) -> Response {
    Json(interruption_mode_payload(&state)).into_response()
}

/// Update interruption mode. Resets the attention budget to the mode
/// default, even when re-setting the current mode.
pub async fn put_interruption_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeRequest>,
) -> Response {
    let mode: InterruptionMode = match body.mode.parse() {
        Ok(mode) => mode,
        Err(_) => {
            return error_response(Error::InvalidInput(format!(
                "Invalid mode '{}'. Must be one of: focus, balanced, active",
                body.mode
            )));
        }
    };

    state.context.set_interruption_mode(mode).await;

    if let Err(e) = state.profile.set_interruption_mode(mode).await {
        return error_response(e);
    }

    Json(interruption_mode_payload(&state)).into_response()
}

/// Current capture mode, read by the sensor.
pub async fn get_capture_mode(State(state): State<AppState>) -> Response {
    let ctx = state.context.get();
    Json(serde_json::json!({ "mode": ctx.capture_mode })).into_response()
}

/// Update the sensor capture mode.
pub async fn put_capture_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeRequest>,
) -> Response {
    let mode: CaptureMode = match body.mode.parse() {
        Ok(mode) => mode,
        Err(_) => {
            return error_response(Error::InvalidInput(format!(
                "Invalid mode '{}'. Must be one of: on_switch, balanced, detailed",
                body.mode
            )));
        }
    };

    state.context.set_capture_mode(mode).await;

    if let Err(e) = state.profile.set_capture_mode(mode).await {
        return error_response(e);
    }

    Json(serde_json::json!({ "mode": mode })).into_response()
}
