//! Activity digest: daily screen-activity summary written by the LLM.

use chrono::Utc;

use crate::error::Result;
use crate::jobs::{complete_with_timeout, JobContext};
use crate::llm::CompletionRequest;
use crate::observer::screen::DailySummary;
use crate::observer::ProactiveMessage;
use crate::types::InterventionType;

fn digest_prompt(soul: &str, summary: &DailySummary) -> String {
    let activity_breakdown = breakdown_lines(&summary.by_activity);
    let project_breakdown = if summary.by_project.is_empty() {
        "No projects detected".to_string()
    } else {
        breakdown_lines(&summary.by_project)
    };
    let streaks = if summary.longest_streaks.is_empty() {
        "No significant streaks".to_string()
    } else {
        summary
            .longest_streaks
            .iter()
            .map(|s| {
                format!(
                    "- {}: {}m (started {})",
                    s.activity,
                    s.duration_minutes,
                    s.started_at.format("%Y-%m-%d %H:%M")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a proactive personal assistant. Generate a concise daily activity digest for the user.\n\
\n\
Be observational and constructive.\n\
\n\
## User Identity\n\
{soul}\n\
\n\
## Today's Screen Activity\n\
- Total tracked time: {} minutes\n\
- Context switches: {}\n\
\n\
## Time by Activity Type\n\
{activity_breakdown}\n\
\n\
## Time by Project\n\
{project_breakdown}\n\
\n\
## Longest Focus Streaks\n\
{streaks}\n\
\n\
Write a short activity digest (4-8 sentences) covering:\n\
1. Time distribution highlights (where did most time go?)\n\
2. Focus patterns (long streaks? frequent switching?)\n\
3. One concrete observation about work patterns\n\
4. One suggestion for tomorrow\n\
\n\
Be concise. No preamble. Just the digest text.",
        summary.total_tracked_minutes, summary.switch_count,
    )
}

fn breakdown_lines(entries: &[(String, i64)]) -> String {
    if entries.is_empty() {
        return "No data".to_string();
    }
    entries
        .iter()
        .map(|(name, secs)| format!("- {}: {}m", name, secs / 60))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate and dispatch the daily activity digest.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let today = Utc::now().with_timezone(&ctx.settings.timezone).date_naive();
    let summary = ctx.screen.daily_summary(today).await?;

    if summary.total_observations == 0 {
        tracing::info!("activity_digest: no observations today, skipping");
        return Ok(());
    }

    let soul = ctx.soul.read();
    let request = CompletionRequest::new(digest_prompt(&soul, &summary))
        .with_temperature(0.6)
        .with_max_tokens(768);

    let Some(text) = complete_with_timeout(
        ctx.llm.as_ref(),
        request,
        ctx.settings.agent_briefing_timeout,
        "activity_digest",
    )
    .await?
    else {
        return Ok(());
    };

    ctx.delivery
        .dispatch(
            ProactiveMessage::new(
                text.trim().to_string(),
                InterventionType::Advisory,
                2,
                "Scheduled daily activity digest",
            ),
            true,
        )
        .await;

    tracing::info!("activity_digest: delivered daily digest");
    Ok(())
}
