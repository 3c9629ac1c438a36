//! Unified snapshot of all context sources.
//!
//! One `CurrentContext` exists per process, owned by the `ContextManager`
//! and published as an immutable `Arc`. Everything that reads live state
//! reads one of these snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::observer::sources::{CalendarEvent, VcsEntry};
use crate::types::{CaptureMode, DataQuality, InterruptionMode, TimeOfDay, UserState};

/// Sensor heartbeat window: the sensor counts as connected if it posted
/// within this many seconds.
pub const SENSOR_HEARTBEAT_SECS: i64 = 30;

/// Screen context is truncated to this many characters in prompt blocks.
const SCREEN_CONTEXT_PROMPT_LIMIT: usize = 500;

/// Partial update posted by the external sensor.
///
/// `None` fields mean "do not overwrite" so the window loop and the OCR
/// loop never clobber each other's data. A patch with both fields absent
/// still counts as a heartbeat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorPatch {
    pub active_window: Option<String>,
    pub screen_context: Option<String>,
}

/// Unified context snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentContext {
    // Time source
    pub time_of_day: TimeOfDay,
    pub day_of_week: String,
    pub is_working_hours: bool,

    // Calendar source
    pub upcoming_events: Vec<CalendarEvent>,
    pub current_event: Option<String>,

    // VCS source
    pub recent_vcs_activity: Option<Vec<VcsEntry>>,

    // Goal source
    pub active_goals_summary: String,

    // Interaction tracking
    pub last_interaction: Option<DateTime<Utc>>,

    // State machine
    pub user_state: UserState,
    pub previous_user_state: UserState,
    pub interruption_mode: InterruptionMode,
    pub attention_budget_remaining: u32,
    pub attention_budget_last_reset: Option<DateTime<Utc>>,

    // Sensor
    pub capture_mode: CaptureMode,
    pub active_window: Option<String>,
    pub screen_context: Option<String>,
    pub last_sensor_post: Option<DateTime<Utc>>,

    pub data_quality: DataQuality,
}

impl Default for CurrentContext {
    fn default() -> Self {
        Self {
            time_of_day: TimeOfDay::Night,
            day_of_week: String::new(),
            is_working_hours: false,
            upcoming_events: Vec::new(),
            current_event: None,
            recent_vcs_activity: None,
            active_goals_summary: String::new(),
            last_interaction: None,
            user_state: UserState::Available,
            previous_user_state: UserState::Available,
            interruption_mode: InterruptionMode::Balanced,
            attention_budget_remaining: 5,
            attention_budget_last_reset: None,
            capture_mode: CaptureMode::Balanced,
            active_window: None,
            screen_context: None,
            last_sensor_post: None,
            data_quality: DataQuality::Stale,
        }
    }
}

impl CurrentContext {
    /// Apply a sensor patch, returning the next snapshot.
    ///
    /// Pure merge: absent fields keep the previous value, and the heartbeat
    /// is stamped unconditionally.
    pub fn merge_sensor_patch(&self, patch: &SensorPatch, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(window) = &patch.active_window {
            next.active_window = Some(window.clone());
        }
        if let Some(screen) = &patch.screen_context {
            next.screen_context = Some(screen.clone());
        }
        next.last_sensor_post = Some(now);
        next
    }

    /// Whether the sensor posted within the heartbeat window.
    pub fn sensor_connected(&self, now: DateTime<Utc>) -> bool {
        self.last_sensor_post
            .map(|last| (now - last).num_seconds() < SENSOR_HEARTBEAT_SECS)
            .unwrap_or(false)
    }

    /// Format the snapshot as a text block for LLM prompt injection.
    pub fn to_prompt_block(&self, now: DateTime<Utc>) -> String {
        let mut lines = vec![
            format!("Time: {} ({})", self.time_of_day, self.day_of_week),
            format!(
                "Working hours: {}",
                if self.is_working_hours { "yes" } else { "no" }
            ),
        ];

        if let Some(event) = &self.current_event {
            lines.push(format!("Current event: {event}"));
        }

        if !self.upcoming_events.is_empty() {
            let events: Vec<String> = self
                .upcoming_events
                .iter()
                .take(3)
                .map(|e| format!("  - {} at {}", e.summary, e.start.to_rfc3339()))
                .collect();
            lines.push(format!("Upcoming events:\n{}", events.join("\n")));
        }

        if let Some(activity) = &self.recent_vcs_activity {
            lines.push(format!(
                "Recent commit activity: {} commits in the last hour",
                activity.len()
            ));
        }

        if !self.active_goals_summary.is_empty() {
            lines.push(format!("Active goals: {}", self.active_goals_summary));
        }

        if let Some(window) = &self.active_window {
            lines.push(format!("User is in: {window}"));
        }

        if let Some(screen) = &self.screen_context {
            let truncated = if screen.chars().count() > SCREEN_CONTEXT_PROMPT_LIMIT {
                let head: String = screen.chars().take(SCREEN_CONTEXT_PROMPT_LIMIT).collect();
                format!("{head}...")
            } else {
                screen.clone()
            };
            lines.push(format!("Screen content: {truncated}"));
        }

        if let Some(last) = self.last_interaction {
            let minutes_ago = (now - last).num_minutes();
            lines.push(format!("Last interaction: {minutes_ago}m ago"));
        }

        lines.push(format!(
            "User state: {} | Mode: {} | Budget: {}",
            self.user_state, self.interruption_mode, self.attention_budget_remaining
        ));

        lines.join("\n")
    }
}
