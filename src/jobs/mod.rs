//! Background jobs driven by the scheduler.
//!
//! Every job is an async function over a shared `JobContext`; the
//! scheduler wraps each invocation in a catch-all so a failing job can
//! never tear down the tick loop. LLM-invoking jobs bound the call with a
//! per-job timeout and return without dispatching when it elapses.

pub mod activity_digest;
pub mod calendar_scan;
pub mod consolidation;
pub mod daily_briefing;
pub mod evening_review;
pub mod goal_check;
pub mod screen_cleanup;
pub mod strategist;
pub mod weekly_review;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::error::Result;
use crate::goals::GoalRepository;
use crate::llm::{CompletionRequest, LLMClient};
use crate::memory::{MemoryStore, SoulFile};
use crate::observer::{ContextManager, DeliveryCoordinator, ScreenObservationRepository};
use crate::sessions::SessionStore;

/// Shared capabilities handed to every job.
pub struct JobContext {
    pub settings: Settings,
    pub context: Arc<ContextManager>,
    pub delivery: Arc<DeliveryCoordinator>,
    pub screen: ScreenObservationRepository,
    pub llm: Arc<dyn LLMClient>,
    pub memory: Arc<dyn MemoryStore>,
    pub goals: Arc<dyn GoalRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub soul: SoulFile,
}

/// Run an LLM completion under the job's timeout.
///
/// Returns `Ok(None)` when the timeout elapses (logged at warn); provider
/// errors propagate to the scheduler's catch-all.
pub(crate) async fn complete_with_timeout(
    llm: &dyn LLMClient,
    request: CompletionRequest,
    timeout: Duration,
    job: &str,
) -> Result<Option<String>> {
    match tokio::time::timeout(timeout, llm.complete(request)).await {
        Ok(result) => Ok(Some(result?)),
        Err(_) => {
            tracing::warn!(job, timeout_secs = timeout.as_secs(), "LLM call timed out");
            Ok(None)
        }
    }
}

/// Strip a leading/trailing markdown code fence from an LLM response.
pub(crate) fn strip_markdown_fences(raw: &str) -> String {
    let text = raw.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    // Drop the opening fence line (which may carry a language tag).
    let body = match text.split_once('\n') {
        Some((_, rest)) => rest,
        None => &text[3..],
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_text_untouched() {
        assert_eq!(strip_markdown_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fence_with_language() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_markdown_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_bare_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_markdown_fences(raw), "{\"a\": 1}");
    }
}
