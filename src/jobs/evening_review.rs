//! Evening review: scheduled end-of-day reflection.

use chrono::Utc;

use crate::error::Result;
use crate::jobs::{complete_with_timeout, JobContext};
use crate::llm::CompletionRequest;
use crate::memory::format_memories;
use crate::observer::ProactiveMessage;
use crate::types::InterventionType;

const MEMORY_QUERY: &str = "today decisions progress reflections";
const MEMORY_TOP_K: usize = 5;

fn review_prompt(context_block: &str, soul: &str, memories: &str) -> String {
    format!(
        "You are a proactive personal assistant. Write the user's evening review.\n\
\n\
## User Identity\n\
{soul}\n\
\n\
## Current Context\n\
{context_block}\n\
\n\
## Relevant Memories\n\
{memories}\n\
\n\
Write a short evening reflection (3-6 sentences) covering:\n\
1. How the day went against their goals\n\
2. One thing worth acknowledging\n\
3. One gentle suggestion for tomorrow\n\
\n\
Be calm and encouraging. No preamble. Just the review text."
    )
}

/// Generate and dispatch the evening review.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let snapshot = ctx.context.refresh().await;
    let context_block = snapshot.to_prompt_block(Utc::now());
    let soul = ctx.soul.read();

    let memories = match ctx.memory.search(MEMORY_QUERY, MEMORY_TOP_K).await {
        Ok(items) => format_memories(&items),
        Err(e) => {
            tracing::debug!(error = %e, "evening_review: memory search failed, continuing without");
            String::new()
        }
    };

    let request = CompletionRequest::new(review_prompt(&context_block, &soul, &memories))
        .with_temperature(0.6)
        .with_max_tokens(700);

    let Some(text) = complete_with_timeout(
        ctx.llm.as_ref(),
        request,
        ctx.settings.agent_briefing_timeout,
        "evening_review",
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
                3,
                "Scheduled evening review",
            ),
            true,
        )
        .await;

    tracing::info!("evening_review: delivered evening review");
    Ok(())
}
