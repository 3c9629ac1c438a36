//! Calendar scan: alert the user about imminently starting events.

use chrono::{Duration, Utc};

use crate::error::Result;
use crate::jobs::JobContext;
use crate::observer::ProactiveMessage;
use crate::types::InterventionType;

/// Events starting within this window trigger an alert.
const ALERT_WINDOW_MINUTES: i64 = 15;

/// Scan upcoming calendar events and alert about any starting within the
/// next 15 minutes.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let snapshot = ctx.context.refresh().await;

    if snapshot.upcoming_events.is_empty() {
        tracing::debug!("calendar_scan: no upcoming events");
        return Ok(());
    }

    let now = Utc::now();
    let window = Duration::minutes(ALERT_WINDOW_MINUTES);

    let imminent: Vec<&str> = snapshot
        .upcoming_events
        .iter()
        .filter(|event| {
            let delta = event.start - now;
            delta > Duration::zero() && delta <= window
        })
        .map(|event| event.summary.as_str())
        .collect();

    if imminent.is_empty() {
        return Ok(());
    }

    let content = format!("Heads up! Starting soon: {}", imminent.join(", "));
    ctx.delivery
        .dispatch(
            ProactiveMessage::new(
                content,
                InterventionType::Alert,
                4,
                "Calendar event starting within 15 minutes",
            ),
            false,
        )
        .await;

    tracing::info!(count = imminent.len(), "calendar_scan: alerted for imminent events");
    Ok(())
}
