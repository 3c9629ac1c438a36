//! Goal check: ambient progress signal computed from the goal dashboard.

use crate::error::Result;
use crate::jobs::JobContext;
use crate::observer::ProactiveMessage;

/// Completion ratio below this (with goals still active) reads as behind.
const BEHIND_THRESHOLD: f64 = 0.5;

/// Compute the goal completion ratio and broadcast an ambient
/// `on_track` / `goal_behind` state message.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let dashboard = ctx.goals.dashboard().await?;

    if dashboard.total_count == 0 {
        tracing::debug!("goal_check: no goals defined");
        return Ok(());
    }

    let ratio = dashboard.completion_ratio();
    let behind = ratio < BEHIND_THRESHOLD && dashboard.active_count > 0;
    let state = if behind { "goal_behind" } else { "on_track" };

    let content = format!(
        "Goals: {} of {} complete",
        dashboard.completed_count, dashboard.total_count
    );
    let tooltip = format!("{:.0}% of goals complete", ratio * 100.0);

    ctx.delivery
        .dispatch(
            ProactiveMessage::ambient(content, state, Some(tooltip)),
            false,
        )
        .await;

    tracing::info!(state, ratio, "goal_check: broadcast progress state");
    Ok(())
}
