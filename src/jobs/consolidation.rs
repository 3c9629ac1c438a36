//! Memory consolidation: extract durable facts from recent conversations.
//!
//! A periodic catch-all over sessions updated in the last hour. Each
//! session's history goes to the LLM for extraction; results land in the
//! memory store and, when significant, in the soul file.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::jobs::{complete_with_timeout, strip_markdown_fences, JobContext};
use crate::llm::CompletionRequest;
use crate::memory::MemoryCategory;

/// Sessions touched within this window are candidates.
const RECENCY_WINDOW_HOURS: i64 = 1;

/// At most this many sessions are consolidated per run.
const MAX_SESSIONS: usize = 10;

/// Messages pulled from each session history.
const HISTORY_LIMIT: usize = 30;

/// Histories shorter than this are trivial small talk; skip them.
const MIN_HISTORY_CHARS: usize = 50;

/// Extracted items shorter than this are not worth storing.
const MIN_ITEM_CHARS: usize = 10;

#[derive(Deserialize, Default)]
struct Extraction {
    #[serde(default)]
    facts: Vec<String>,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    goals: Vec<String>,
    #[serde(default)]
    reflections: Vec<String>,
    #[serde(default)]
    soul_updates: HashMap<String, String>,
}

fn consolidation_prompt(conversation: &str, soul: &str) -> String {
    format!(
        "Analyze this conversation and extract key information to remember long-term.\n\
\n\
Return a JSON object with these fields:\n\
- \"facts\": list of factual statements learned about the user (name, role, preferences, etc.)\n\
- \"patterns\": list of behavioral patterns observed\n\
- \"goals\": list of goals or intentions the user mentioned\n\
- \"reflections\": list of insights or decisions made\n\
- \"soul_updates\": dict of soul sections to update (only if significant new identity/goal info). \
Keys are section names like \"Identity\", \"Values\", \"Goals\". Values are the new content. \
Return empty dict if no updates needed.\n\
\n\
Be selective: only extract things worth remembering across future conversations.\n\
If the conversation is trivial small talk with nothing worth remembering, return all empty \
lists and empty dict.\n\
\n\
Conversation:\n\
{conversation}\n\
\n\
Current soul file:\n\
{soul}\n\
\n\
Return ONLY valid JSON, no markdown fences."
    )
}

/// Consolidate all recently-updated sessions.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let cutoff = Utc::now() - Duration::hours(RECENCY_WINDOW_HOURS);
    let sessions = ctx.sessions.recently_updated(cutoff, MAX_SESSIONS).await?;

    let mut consolidated = 0;
    for session in &sessions {
        match consolidate_session(ctx, &session.id).await {
            Ok(true) => consolidated += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "Consolidation failed");
            }
        }
    }

    if consolidated > 0 {
        tracing::info!(consolidated, "memory_consolidation: processed sessions");
    }
    Ok(())
}

/// Consolidate one session. Returns whether anything was extracted.
async fn consolidate_session(ctx: &JobContext, session_id: &str) -> Result<bool> {
    let history = ctx.sessions.history_text(session_id, HISTORY_LIMIT).await?;
    if history.len() < MIN_HISTORY_CHARS {
        return Ok(false);
    }

    let soul = ctx.soul.read();
    let request = CompletionRequest::new(consolidation_prompt(&history, &soul))
        .with_temperature(0.3)
        .with_max_tokens(1024);

    let Some(raw) = complete_with_timeout(
        ctx.llm.as_ref(),
        request,
        ctx.settings.consolidation_llm_timeout,
        "memory_consolidation",
    )
    .await?
    else {
        return Ok(false);
    };

    let text = strip_markdown_fences(&raw);
    let extraction: Extraction = match serde_json::from_str(&text) {
        Ok(extraction) => extraction,
        Err(e) => {
            tracing::warn!(session = %session_id, error = %e, "Unparseable consolidation response");
            return Ok(false);
        }
    };

    let mut stored = 0;
    let batches = [
        (MemoryCategory::Fact, &extraction.facts),
        (MemoryCategory::Pattern, &extraction.patterns),
        (MemoryCategory::Goal, &extraction.goals),
        (MemoryCategory::Reflection, &extraction.reflections),
    ];
    for (category, items) in batches {
        for item in items {
            if item.len() > MIN_ITEM_CHARS {
                ctx.memory.store(item, category, Some(session_id)).await?;
                stored += 1;
            }
        }
    }

    for (section, content) in &extraction.soul_updates {
        if !content.trim().is_empty() {
            ctx.soul.update_section(section, content)?;
            tracing::info!(section, "Soul updated");
        }
    }

    tracing::info!(
        session = %session_id,
        stored,
        soul_updates = extraction.soul_updates.len(),
        "Consolidated session"
    );
    Ok(stored > 0 || !extraction.soul_updates.is_empty())
}
