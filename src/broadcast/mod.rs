//! Broadcast fan-out for proactive messages.
//!
//! Keeps a registry of subscribers (one per WebSocket connection); every
//! delivered message is pushed to all of them, fire-and-forget. A
//! subscriber whose channel is gone is dropped from the registry.

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::InterventionType;

/// A message on its way to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub intervention_type: Option<InterventionType>,
    pub urgency: Option<u8>,
    pub reasoning: Option<String>,
    pub state: Option<String>,
    pub tooltip: Option<String>,
}

impl OutboundMessage {
    /// A proactive chat-surface message.
    pub fn proactive(
        content: impl Into<String>,
        intervention_type: InterventionType,
        urgency: u8,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            kind: "proactive".to_string(),
            content: content.into(),
            intervention_type: Some(intervention_type),
            urgency: Some(urgency),
            reasoning: Some(reasoning.into()),
            state: None,
            tooltip: None,
        }
    }

    /// An ambient status message (state tag plus tooltip, no chat surface).
    pub fn ambient(
        content: impl Into<String>,
        state: impl Into<String>,
        tooltip: Option<String>,
    ) -> Self {
        Self {
            kind: "ambient".to_string(),
            content: content.into(),
            intervention_type: Some(InterventionType::Ambient),
            urgency: Some(1),
            reasoning: None,
            state: Some(state.into()),
            tooltip,
        }
    }
}

struct Subscriber {
    id: Uuid,
    seq: u64,
    tx: mpsc::UnboundedSender<String>,
}

/// Registry of active subscribers.
#[derive(Default)]
pub struct Broadcaster {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_count(&self) -> usize {
        self.subscribers.lock().expect("subscriber lock").len()
    }

    /// Register a new subscriber; the returned receiver yields serialized
    /// messages until `unsubscribe` is called or the broadcaster drops it.
    pub fn subscribe(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .expect("subscriber lock")
            .push(Subscriber { id, seq: 0, tx });
        tracing::debug!(subscriber = %id, active = self.active_count(), "Subscriber registered");
        (id, rx)
    }

    pub fn unsubscribe(&self, id: Uuid) {
        let mut subs = self.subscribers.lock().expect("subscriber lock");
        subs.retain(|s| s.id != id);
        tracing::debug!(subscriber = %id, active = subs.len(), "Subscriber removed");
    }

    /// Send a message to every subscriber, dropping any whose channel has
    /// closed. `seq` is stamped per connection.
    pub fn broadcast(&self, message: &OutboundMessage) {
        let payload = match serde_json::to_value(message) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast message");
                return;
            }
        };

        let mut subs = self.subscribers.lock().expect("subscriber lock");
        subs.retain_mut(|sub| {
            sub.seq += 1;
            let mut framed = payload.clone();
            if let Some(obj) = framed.as_object_mut() {
                obj.insert("seq".to_string(), serde_json::json!(sub.seq));
            }
            match sub.tx.send(framed.to_string()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(subscriber = %sub.id, "Dropping dead subscriber");
                    false
                }
            }
        });
    }
}
