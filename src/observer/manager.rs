//! Context manager: owns the single `CurrentContext` and serializes every
//! mutation of it.
//!
//! `refresh()` holds the state lock across the whole source fan-out so
//! refreshes are totally ordered; `get()` never blocks, it just clones the
//! currently-published `Arc` snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Timelike, Utc};
use tokio::sync::{mpsc, Mutex};

use crate::config::Settings;
use crate::observer::context::{CurrentContext, SensorPatch};
use crate::observer::sources::{ContextSource, SourcePartial};
use crate::observer::state::{self, StateSignals};
use crate::types::{CaptureMode, DataQuality, InterruptionMode};

/// Maintains and refreshes the unified context snapshot.
pub struct ContextManager {
    settings: Settings,
    sources: Vec<ContextSource>,

    /// Authoritative state; the lock serializes refreshes and mutators.
    inner: Mutex<CurrentContext>,
    /// Published immutable snapshot for lock-free reads.
    published: RwLock<Arc<CurrentContext>>,

    /// Monotonic counter of blocked → unblocked transitions. The drain task
    /// compares its epoch against this to stay at-most-once under flapping.
    transition_epoch: AtomicU64,
    transition_tx: mpsc::UnboundedSender<u64>,
}

impl ContextManager {
    /// Create a manager with the given sources and transition channel.
    ///
    /// The receiving end of `transition_tx` should run the queued-bundle
    /// drain (see `Runtime`).
    pub fn new(
        settings: Settings,
        sources: Vec<ContextSource>,
        transition_tx: mpsc::UnboundedSender<u64>,
    ) -> Self {
        let initial = CurrentContext::default();
        Self {
            settings,
            sources,
            published: RwLock::new(Arc::new(initial.clone())),
            inner: Mutex::new(initial),
            transition_epoch: AtomicU64::new(0),
            transition_tx,
        }
    }

    /// Seed durable profile settings into the in-memory context at startup.
    pub async fn restore_profile(&self, mode: InterruptionMode, capture: CaptureMode) {
        let mut inner = self.inner.lock().await;
        inner.interruption_mode = mode;
        inner.attention_budget_remaining = state::default_budget(mode);
        inner.capture_mode = capture;
        self.publish(&inner);
    }

    /// Current snapshot. Non-blocking.
    pub fn get(&self) -> Arc<CurrentContext> {
        self.published
            .read()
            .expect("published snapshot lock poisoned")
            .clone()
    }

    /// Epoch of the most recent blocked → unblocked transition.
    pub fn current_epoch(&self) -> u64 {
        self.transition_epoch.load(Ordering::SeqCst)
    }

    /// Gather all sources and merge into a new context snapshot.
    ///
    /// Preserves externally-managed fields (interaction stamp, sensor data,
    /// mode, budget), derives user state and data quality, applies the daily
    /// budget reset, and signals blocked → unblocked transitions.
    pub async fn refresh(&self) -> Arc<CurrentContext> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let old = inner.clone();

        let sources_total = self.sources.len();
        let mut sources_ok = 0usize;

        let mut time_snap = None;
        let mut calendar_snap = None;
        let mut vcs_activity = None;
        let mut goals_summary = None;

        for source in &self.sources {
            match source.gather(&self.settings, now).await {
                Ok(SourcePartial::Time(snap)) => {
                    time_snap = Some(snap);
                    sources_ok += 1;
                }
                Ok(SourcePartial::Calendar(snap)) => {
                    calendar_snap = Some(snap);
                    sources_ok += 1;
                }
                Ok(SourcePartial::Vcs(entries)) => {
                    vcs_activity = entries;
                    sources_ok += 1;
                }
                Ok(SourcePartial::Goals(summary)) => {
                    goals_summary = Some(summary);
                    sources_ok += 1;
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "Context source failed");
                }
            }
        }

        let data_quality = DataQuality::from_counts(sources_ok, sources_total);

        // Time fields carry over if the time source failed; a failed
        // calendar reads as "no events" rather than a stale meeting.
        let (time_of_day, day_of_week, is_working_hours) = match time_snap {
            Some(snap) => (snap.time_of_day, snap.day_of_week, snap.is_working_hours),
            None => (old.time_of_day, old.day_of_week.clone(), old.is_working_hours),
        };
        let calendar = calendar_snap.unwrap_or_default();

        let new_state = state::derive_state(&StateSignals {
            now,
            current_event: calendar.current_event.as_deref(),
            previous_state: old.user_state,
            time_of_day,
            is_working_hours,
            last_interaction: old.last_interaction,
            active_window: old.active_window.as_deref(),
        });

        let (budget, budget_last_reset) = self.maybe_reset_budget(
            old.interruption_mode,
            old.attention_budget_remaining,
            old.attention_budget_last_reset,
            now,
        );

        *inner = CurrentContext {
            time_of_day,
            day_of_week,
            is_working_hours,
            upcoming_events: calendar.upcoming_events,
            current_event: calendar.current_event,
            recent_vcs_activity: vcs_activity,
            active_goals_summary: goals_summary.unwrap_or_default(),
            last_interaction: old.last_interaction,
            user_state: new_state,
            previous_user_state: old.user_state,
            interruption_mode: old.interruption_mode,
            attention_budget_remaining: budget,
            attention_budget_last_reset: budget_last_reset,
            capture_mode: old.capture_mode,
            active_window: old.active_window,
            screen_context: old.screen_context,
            last_sensor_post: old.last_sensor_post,
            data_quality,
        };
        let snapshot = self.publish(&inner);

        if old.user_state.is_blocked() && new_state.is_unblocked() {
            let epoch = self.transition_epoch.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(
                from = %old.user_state,
                to = %new_state,
                epoch,
                "State transition, scheduling queued-bundle delivery"
            );
            if self.transition_tx.send(epoch).is_err() {
                tracing::warn!("Transition channel closed, bundle will not be delivered");
            }
        }

        snapshot
    }

    /// Stamp the current time as the last user interaction.
    pub async fn record_interaction(&self) {
        let mut inner = self.inner.lock().await;
        inner.last_interaction = Some(Utc::now());
        self.publish(&inner);
    }

    /// Apply a partial sensor update.
    ///
    /// Absent fields are left untouched; even an empty patch stamps the
    /// sensor heartbeat.
    pub async fn apply_sensor_patch(&self, patch: &SensorPatch) {
        let mut inner = self.inner.lock().await;
        *inner = inner.merge_sensor_patch(patch, Utc::now());
        self.publish(&inner);
    }

    /// Reduce the attention budget by one, clamping at zero.
    pub async fn decrement_budget(&self) {
        let mut inner = self.inner.lock().await;
        inner.attention_budget_remaining = inner.attention_budget_remaining.saturating_sub(1);
        self.publish(&inner);
    }

    /// Change interruption mode and reset the budget to the mode default.
    pub async fn set_interruption_mode(&self, mode: InterruptionMode) {
        let mut inner = self.inner.lock().await;
        inner.interruption_mode = mode;
        inner.attention_budget_remaining = state::default_budget(mode);
        inner.attention_budget_last_reset = Some(Utc::now());
        self.publish(&inner);
        tracing::info!(mode = %mode, budget = state::default_budget(mode), "Interruption mode set");
    }

    /// Change the sensor capture mode.
    pub async fn set_capture_mode(&self, mode: CaptureMode) {
        let mut inner = self.inner.lock().await;
        inner.capture_mode = mode;
        self.publish(&inner);
    }

    fn publish(&self, ctx: &CurrentContext) -> Arc<CurrentContext> {
        let snapshot = Arc::new(ctx.clone());
        *self
            .published
            .write()
            .expect("published snapshot lock poisoned") = snapshot.clone();
        snapshot
    }

    /// Reset the attention budget at the morning briefing hour if it has
    /// not been reset today.
    ///
    /// Date-based comparison keeps the reset immune to clock jumps.
    fn maybe_reset_budget(
        &self,
        mode: InterruptionMode,
        current_budget: u32,
        last_reset: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> (u32, Option<DateTime<Utc>>) {
        let reset_hour = self.settings.morning_briefing_hour;

        let Some(last) = last_reset else {
            return (state::default_budget(mode), Some(now));
        };

        let last_date = last.date_naive();
        let today = now.date_naive();

        // New day and past the reset hour
        if today > last_date && now.hour() >= reset_hour {
            return (state::default_budget(mode), Some(now));
        }

        // Same day but crossed the reset hour since the last reset
        if today == last_date && last.hour() < reset_hour && reset_hour <= now.hour() {
            return (state::default_budget(mode), Some(now));
        }

        (current_budget, last_reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn manager() -> (ContextManager, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mgr = ContextManager::new(Settings::default(), vec![ContextSource::Time], tx);
        (mgr, rx)
    }

    #[tokio::test]
    async fn test_refresh_preserves_externally_managed_fields() {
        let (mgr, _rx) = manager();
        mgr.record_interaction().await;
        mgr.apply_sensor_patch(&SensorPatch {
            active_window: Some("Terminal".to_string()),
            screen_context: Some("logs".to_string()),
        })
        .await;

        let snap = mgr.refresh().await;
        assert_eq!(snap.active_window.as_deref(), Some("Terminal"));
        assert_eq!(snap.screen_context.as_deref(), Some("logs"));
        assert!(snap.last_interaction.is_some());
        assert!(snap.last_sensor_post.is_some());
    }

    #[tokio::test]
    async fn test_previous_state_tracks_pre_refresh_state() {
        let (mgr, _rx) = manager();
        let before = mgr.get().user_state;
        let snap = mgr.refresh().await;
        assert_eq!(snap.previous_user_state, before);
    }

    #[tokio::test]
    async fn test_decrement_clamps_at_zero() {
        let (mgr, _rx) = manager();
        mgr.set_interruption_mode(InterruptionMode::Focus).await;
        assert_eq!(mgr.get().attention_budget_remaining, 0);
        mgr.decrement_budget().await;
        assert_eq!(mgr.get().attention_budget_remaining, 0);
    }

    #[tokio::test]
    async fn test_set_mode_resets_budget_even_when_unchanged() {
        let (mgr, _rx) = manager();
        mgr.set_interruption_mode(InterruptionMode::Balanced).await;
        mgr.decrement_budget().await;
        assert_eq!(mgr.get().attention_budget_remaining, 4);

        mgr.set_interruption_mode(InterruptionMode::Balanced).await;
        assert_eq!(mgr.get().attention_budget_remaining, 5);
    }

    #[tokio::test]
    async fn test_budget_reset_rules() {
        let (mgr, _rx) = manager();

        // Missing last reset: reset now
        let now = Utc.with_ymd_and_hms(2025, 6, 11, 10, 0, 0).unwrap();
        let (budget, stamp) =
            mgr.maybe_reset_budget(InterruptionMode::Balanced, 1, None, now);
        assert_eq!(budget, 5);
        assert_eq!(stamp, Some(now));

        // New day, past the reset hour (default 8)
        let last = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        let (budget, _) =
            mgr.maybe_reset_budget(InterruptionMode::Balanced, 1, Some(last), now);
        assert_eq!(budget, 5);

        // New day but before the reset hour: no reset
        let early = Utc.with_ymd_and_hms(2025, 6, 11, 7, 0, 0).unwrap();
        let (budget, stamp) =
            mgr.maybe_reset_budget(InterruptionMode::Balanced, 1, Some(last), early);
        assert_eq!(budget, 1);
        assert_eq!(stamp, Some(last));

        // Same day, crossed the reset hour since the last reset
        let last_same_day = Utc.with_ymd_and_hms(2025, 6, 11, 6, 0, 0).unwrap();
        let (budget, _) =
            mgr.maybe_reset_budget(InterruptionMode::Balanced, 1, Some(last_same_day), now);
        assert_eq!(budget, 5);

        // Same day, already reset after the hour: no reset
        let last_after = Utc.with_ymd_and_hms(2025, 6, 11, 9, 0, 0).unwrap();
        let (budget, _) =
            mgr.maybe_reset_budget(InterruptionMode::Balanced, 1, Some(last_after), now);
        assert_eq!(budget, 1);
    }

    #[tokio::test]
    async fn test_sensor_patch_sequence() {
        let (mgr, _rx) = manager();
        mgr.apply_sensor_patch(&SensorPatch {
            active_window: Some("VS Code".into()),
            screen_context: Some("A".into()),
        })
        .await;
        mgr.apply_sensor_patch(&SensorPatch {
            active_window: None,
            screen_context: Some("B".into()),
        })
        .await;
        mgr.apply_sensor_patch(&SensorPatch {
            active_window: Some("Terminal".into()),
            screen_context: None,
        })
        .await;

        let snap = mgr.get();
        assert_eq!(snap.active_window.as_deref(), Some("Terminal"));
        assert_eq!(snap.screen_context.as_deref(), Some("B"));
        assert!(snap.last_sensor_post.is_some());
    }
}
