//! Weekly activity review: 7-day screen-activity rollup written by the LLM.

use chrono::{Datelike, Duration, Utc};

use crate::error::Result;
use crate::jobs::{complete_with_timeout, JobContext};
use crate::llm::CompletionRequest;
use crate::observer::screen::WeeklySummary;
use crate::observer::ProactiveMessage;
use crate::types::InterventionType;

fn review_prompt(soul: &str, summary: &WeeklySummary) -> String {
    let activity_breakdown = breakdown_lines(&summary.by_activity);
    let project_breakdown = if summary.by_project.is_empty() {
        "No projects detected".to_string()
    } else {
        breakdown_lines(&summary.by_project)
    };
    let daily_breakdown = summary
        .daily_breakdown
        .iter()
        .filter(|d| d.observations > 0)
        .map(|d| {
            format!(
                "- {}: {}m tracked, {} switches",
                d.date, d.tracked_minutes, d.observations
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let daily_breakdown = if daily_breakdown.is_empty() {
        "No daily data".to_string()
    } else {
        daily_breakdown
    };

    format!(
        "You are a proactive personal assistant. Generate a weekly activity review for the user.\n\
\n\
Be analytical and forward-looking.\n\
\n\
## User Identity\n\
{soul}\n\
\n\
## This Week's Screen Activity ({} to {})\n\
- Total tracked time: {} minutes\n\
- Total context switches: {}\n\
\n\
## Weekly Activity Breakdown\n\
{activity_breakdown}\n\
\n\
## Project Allocation\n\
{project_breakdown}\n\
\n\
## Daily Breakdown\n\
{daily_breakdown}\n\
\n\
Write a weekly activity review (5-10 sentences) covering:\n\
1. Weekly overview: where did time go?\n\
2. Daily patterns: which days were most productive?\n\
3. Project allocation: balanced or lopsided?\n\
4. Two suggestions for next week\n\
5. One automation or workflow idea\n\
\n\
Be concise. No preamble. Just the review text.",
        summary.week_start,
        summary.week_end,
        summary.total_tracked_minutes,
        summary.total_observations,
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

/// Generate and dispatch the weekly activity review.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let today = Utc::now().with_timezone(&ctx.settings.timezone).date_naive();
    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);

    let summary = ctx.screen.weekly_summary(week_start).await?;
    if summary.total_observations == 0 {
        tracing::info!("weekly_activity_review: no observations this week, skipping");
        return Ok(());
    }

    let soul = ctx.soul.read();
    let request = CompletionRequest::new(review_prompt(&soul, &summary))
        .with_temperature(0.6)
        .with_max_tokens(1024);

    let Some(text) = complete_with_timeout(
        ctx.llm.as_ref(),
        request,
        ctx.settings.agent_briefing_timeout,
        "weekly_activity_review",
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
                "Scheduled weekly activity review",
            ),
            true,
        )
        .await;

    tracing::info!("weekly_activity_review: delivered weekly review");
    Ok(())
}
