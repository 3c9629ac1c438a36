//! Delivery coordinator: the single entry point for all proactive
//! messages.
//!
//! Every job hands its message here; the coordinator reads a fresh context
//! snapshot, runs the delivery gate, and then broadcasts, queues, or drops.

use std::sync::Arc;

use crate::broadcast::{Broadcaster, OutboundMessage};
use crate::error::Result;
use crate::observer::manager::ContextManager;
use crate::observer::queue::InsightQueue;
use crate::observer::state;
use crate::types::{DeliveryDecision, InterventionType};

/// A proactive message heading for the delivery gate.
#[derive(Debug, Clone)]
pub struct ProactiveMessage {
    pub content: String,
    pub intervention_type: InterventionType,
    pub urgency: u8,
    pub reasoning: String,
    /// Ambient-state tag, for `ambient` messages only.
    pub state: Option<String>,
    pub tooltip: Option<String>,
}

impl ProactiveMessage {
    pub fn new(
        content: impl Into<String>,
        intervention_type: InterventionType,
        urgency: u8,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            intervention_type,
            urgency,
            reasoning: reasoning.into(),
            state: None,
            tooltip: None,
        }
    }

    /// An ambient status message with a state tag.
    pub fn ambient(
        content: impl Into<String>,
        state: impl Into<String>,
        tooltip: Option<String>,
    ) -> Self {
        Self {
            content: content.into(),
            intervention_type: InterventionType::Ambient,
            urgency: 1,
            reasoning: String::new(),
            state: Some(state.into()),
            tooltip,
        }
    }

    fn to_outbound(&self) -> OutboundMessage {
        match &self.state {
            Some(state) => {
                OutboundMessage::ambient(self.content.clone(), state.clone(), self.tooltip.clone())
            }
            None => OutboundMessage::proactive(
                self.content.clone(),
                self.intervention_type,
                self.urgency,
                self.reasoning.clone(),
            ),
        }
    }
}

/// Routes proactive messages through the delivery gate.
pub struct DeliveryCoordinator {
    context: Arc<ContextManager>,
    queue: InsightQueue,
    broadcaster: Arc<Broadcaster>,
}

impl DeliveryCoordinator {
    pub fn new(
        context: Arc<ContextManager>,
        queue: InsightQueue,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            context,
            queue,
            broadcaster,
        }
    }

    /// Decide and act on a proactive message. Returns the decision taken.
    ///
    /// An enqueue failure is logged and reported as a drop; the caller's
    /// job keeps running either way.
    pub async fn dispatch(
        &self,
        message: ProactiveMessage,
        is_scheduled: bool,
    ) -> DeliveryDecision {
        let ctx = self.context.get();

        let decision = state::should_deliver(
            ctx.user_state,
            ctx.interruption_mode,
            ctx.attention_budget_remaining,
            message.urgency,
            message.intervention_type,
            is_scheduled,
        );

        match decision {
            DeliveryDecision::Deliver => {
                self.broadcaster.broadcast(&message.to_outbound());
                if state::should_cost_budget(message.intervention_type, is_scheduled, message.urgency)
                {
                    self.context.decrement_budget().await;
                }
                tracing::info!(
                    intervention_type = %message.intervention_type,
                    urgency = message.urgency,
                    "Delivered proactive message"
                );
                DeliveryDecision::Deliver
            }
            DeliveryDecision::Queue => {
                match self
                    .queue
                    .enqueue(
                        &message.content,
                        message.intervention_type,
                        message.urgency,
                        &message.reasoning,
                    )
                    .await
                {
                    Ok(_) => {
                        tracing::info!(
                            user_state = %ctx.user_state,
                            mode = %ctx.interruption_mode,
                            "Queued proactive message"
                        );
                        DeliveryDecision::Queue
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Enqueue failed, dropping message");
                        DeliveryDecision::Drop
                    }
                }
            }
            DeliveryDecision::Drop => {
                tracing::info!(
                    intervention_type = %message.intervention_type,
                    "Dropped proactive message"
                );
                DeliveryDecision::Drop
            }
        }
    }

    /// Drain the insight queue and deliver the contents as one bundle.
    ///
    /// Called on blocked → unblocked transitions. The bundle bypasses the
    /// gate and costs no budget. Returns the number of bundled items.
    pub async fn deliver_queued_bundle(&self) -> Result<usize> {
        let items = self.queue.drain().await?;
        if items.is_empty() {
            return Ok(0);
        }

        let plural = if items.len() == 1 { "update" } else { "updates" };
        let lines: Vec<String> = items.iter().map(|i| format!("- {}", i.content)).collect();
        let content = format!(
            "While you were away ({} {plural}):\n{}",
            items.len(),
            lines.join("\n")
        );

        self.broadcaster.broadcast(&OutboundMessage::proactive(
            content,
            InterventionType::ProactiveBundle,
            3,
            format!(
                "Bundle of {} queued insight(s) delivered on state transition",
                items.len()
            ),
        ));

        tracing::info!(count = items.len(), "Delivered queued-insight bundle");
        Ok(items.len())
    }
}
