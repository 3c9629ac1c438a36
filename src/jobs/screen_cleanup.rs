//! Screen observation cleanup: enforce the retention window.

use crate::error::Result;
use crate::jobs::JobContext;

/// Delete screen observations older than the configured retention period.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let deleted = ctx
        .screen
        .cleanup_old(ctx.settings.screen_observation_retention_days)
        .await?;

    if deleted > 0 {
        tracing::info!(
            deleted,
            retention_days = ctx.settings.screen_observation_retention_days,
            "screen_cleanup: removed old observations"
        );
    }
    Ok(())
}
