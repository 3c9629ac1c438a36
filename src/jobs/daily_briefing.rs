//! Daily briefing: scheduled morning message built from context, the soul
//! file, and relevant memories.

use chrono::Utc;

use crate::error::Result;
use crate::jobs::{complete_with_timeout, JobContext};
use crate::llm::CompletionRequest;
use crate::memory::format_memories;
use crate::observer::ProactiveMessage;
use crate::types::InterventionType;

const MEMORY_QUERY: &str = "goals priorities plans routines";
const MEMORY_TOP_K: usize = 5;

fn briefing_prompt(context_block: &str, soul: &str, memories: &str) -> String {
    format!(
        "You are a proactive personal assistant. Write the user's morning briefing.\n\
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
Write a short morning briefing (3-6 sentences) covering:\n\
1. What today looks like (calendar, working hours)\n\
2. The top priority given their goals\n\
3. One concrete suggestion for the morning\n\
\n\
Be warm but concise. No preamble. Just the briefing text."
    )
}

/// Generate and dispatch the morning briefing.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let snapshot = ctx.context.refresh().await;
    let context_block = snapshot.to_prompt_block(Utc::now());
    let soul = ctx.soul.read();

    let memories = match ctx.memory.search(MEMORY_QUERY, MEMORY_TOP_K).await {
        Ok(items) => format_memories(&items),
        Err(e) => {
            tracing::debug!(error = %e, "daily_briefing: memory search failed, continuing without");
            String::new()
        }
    };

    let request = CompletionRequest::new(briefing_prompt(&context_block, &soul, &memories))
        .with_temperature(0.6)
        .with_max_tokens(700);

    let Some(text) = complete_with_timeout(
        ctx.llm.as_ref(),
        request,
        ctx.settings.agent_briefing_timeout,
        "daily_briefing",
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
                "Scheduled morning briefing",
            ),
            true,
        )
        .await;

    tracing::info!("daily_briefing: delivered morning briefing");
    Ok(())
}
