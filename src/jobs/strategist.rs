//! Strategist tick: periodic reasoning over the full context block.
//!
//! The LLM sees the context snapshot and the proactivity level and answers
//! with a JSON decision. Anything unparseable is treated as "do not
//! intervene" so a misbehaving model can never spam the user.

use chrono::Utc;
use serde::Deserialize;

use crate::error::Result;
use crate::jobs::{complete_with_timeout, strip_markdown_fences, JobContext};
use crate::llm::CompletionRequest;
use crate::observer::ProactiveMessage;
use crate::types::InterventionType;

const STRATEGIST_TEMPERATURE: f32 = 0.4;
const STRATEGIST_MAX_TOKENS: u32 = 512;

/// Parsed strategist decision.
#[derive(Debug, Clone)]
pub struct StrategistDecision {
    pub should_intervene: bool,
    pub content: String,
    pub intervention_type: InterventionType,
    pub urgency: u8,
    pub reasoning: String,
}

impl StrategistDecision {
    fn no_intervention(reasoning: impl Into<String>) -> Self {
        Self {
            should_intervene: false,
            content: String::new(),
            intervention_type: InterventionType::Nudge,
            urgency: 0,
            reasoning: reasoning.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawDecision {
    #[serde(default)]
    should_intervene: bool,
    #[serde(default)]
    content: String,
    #[serde(default)]
    intervention_type: Option<String>,
    #[serde(default)]
    urgency: Option<u8>,
    #[serde(default)]
    reasoning: String,
}

/// Build the strategist prompt for a context block.
fn strategist_prompt(proactivity_level: u8, context_block: &str) -> String {
    format!(
        "You are the strategic reasoning module of a proactive personal assistant. \
You periodically review the user's context and decide whether an intervention is warranted.\n\
\n\
Proactivity level: {proactivity_level}/5 (1=minimal, 5=very proactive).\n\
\n\
## Current Context\n\
{context_block}\n\
\n\
## Your Task\n\
Analyze the context and decide:\n\
1. Is there something the user should know right now?\n\
2. Would a nudge, advisory, or alert help them?\n\
3. Or is everything fine and no intervention is needed?\n\
\n\
## Response Format\n\
Return ONLY a JSON object (no markdown fences):\n\
{{\n\
  \"should_intervene\": true/false,\n\
  \"content\": \"The message to send to the user (if intervening)\",\n\
  \"intervention_type\": \"nudge\" | \"advisory\" | \"alert\",\n\
  \"urgency\": 1-5,\n\
  \"reasoning\": \"Why you made this decision\"\n\
}}\n\
\n\
Guidelines:\n\
- \"nudge\" = transient hint. Use for gentle prods.\n\
- \"advisory\" = surfaces a chat message. Use for useful information or suggestions.\n\
- \"alert\" = high-urgency surface. Use only for time-sensitive items.\n\
- At proactivity level 1-2, only intervene for urgent or time-sensitive items.\n\
- At proactivity level 3, intervene for helpful suggestions too.\n\
- At proactivity level 4-5, be more liberal with nudges and check-ins.\n\
- If the user is in deep work or a meeting, prefer NOT intervening unless urgent.\n\
- Keep messages concise."
    )
}

/// Parse the strategist's response, falling back to no-intervention on any
/// parse failure.
pub fn parse_decision(raw: &str) -> StrategistDecision {
    if raw.trim().is_empty() {
        return StrategistDecision::no_intervention("Empty response");
    }

    let text = strip_markdown_fences(raw);

    match serde_json::from_str::<RawDecision>(&text) {
        Ok(parsed) => StrategistDecision {
            should_intervene: parsed.should_intervene,
            content: parsed.content,
            intervention_type: parsed
                .intervention_type
                .as_deref()
                .and_then(|t| t.parse().ok())
                .unwrap_or(InterventionType::Nudge),
            urgency: parsed.urgency.unwrap_or(3).min(5),
            reasoning: parsed.reasoning,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse strategist response");
            StrategistDecision::no_intervention(format!("Parse failure: {e}"))
        }
    }
}

/// Run one strategist tick.
pub async fn run(ctx: &JobContext) -> Result<()> {
    let snapshot = ctx.context.refresh().await;
    let context_block = snapshot.to_prompt_block(Utc::now());

    let request = CompletionRequest::new(strategist_prompt(
        ctx.settings.proactivity_level,
        &context_block,
    ))
    .with_temperature(STRATEGIST_TEMPERATURE)
    .with_max_tokens(STRATEGIST_MAX_TOKENS);

    let Some(raw) = complete_with_timeout(
        ctx.llm.as_ref(),
        request,
        ctx.settings.agent_strategist_timeout,
        "strategist_tick",
    )
    .await?
    else {
        return Ok(());
    };

    let decision = parse_decision(&raw);
    if !decision.should_intervene {
        tracing::debug!(reasoning = %decision.reasoning, "strategist_tick: no intervention");
        return Ok(());
    }

    // The tick is not privileged; it goes through the gate like any other
    // proactive message.
    ctx.delivery
        .dispatch(
            ProactiveMessage::new(
                decision.content,
                decision.intervention_type,
                decision.urgency,
                decision.reasoning,
            ),
            false,
        )
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_decision() {
        let raw = r#"{"should_intervene": true, "content": "Take a break", "intervention_type": "nudge", "urgency": 2, "reasoning": "Long focus streak"}"#;
        let decision = parse_decision(raw);
        assert!(decision.should_intervene);
        assert_eq!(decision.content, "Take a break");
        assert_eq!(decision.intervention_type, InterventionType::Nudge);
        assert_eq!(decision.urgency, 2);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"should_intervene\": true, \"content\": \"x\", \"intervention_type\": \"advisory\", \"urgency\": 3, \"reasoning\": \"r\"}\n```";
        let decision = parse_decision(raw);
        assert!(decision.should_intervene);
        assert_eq!(decision.intervention_type, InterventionType::Advisory);
    }

    #[test]
    fn test_parse_garbage_is_no_intervention() {
        let decision = parse_decision("The user seems busy, better not to interrupt.");
        assert!(!decision.should_intervene);
        assert!(decision.reasoning.starts_with("Parse failure"));
    }

    #[test]
    fn test_parse_empty_is_no_intervention() {
        let decision = parse_decision("   ");
        assert!(!decision.should_intervene);
        assert_eq!(decision.reasoning, "Empty response");
    }

    #[test]
    fn test_parse_unknown_type_defaults_to_nudge() {
        let raw = r#"{"should_intervene": true, "content": "x", "intervention_type": "shout", "urgency": 9, "reasoning": ""}"#;
        let decision = parse_decision(raw);
        assert_eq!(decision.intervention_type, InterventionType::Nudge);
        // Urgency is clamped into range.
        assert_eq!(decision.urgency, 5);
    }
}
