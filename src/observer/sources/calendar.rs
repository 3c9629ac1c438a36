//! Calendar context source.
//!
//! Reads from an external calendar collaborator through the
//! `CalendarProvider` trait and reduces the next 24 hours to at most three
//! upcoming events plus the summary of whatever is happening right now.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How far ahead the source looks for upcoming events.
const LOOKAHEAD_HOURS: i64 = 24;

/// At most this many upcoming events are kept in the snapshot.
const MAX_UPCOMING: usize = 3;

/// A calendar event in the lookahead window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// External calendar collaborator.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Events overlapping the given window, in any order.
    async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;
}

/// Provider used when no calendar credentials are configured. Returns
/// empty silently so the source degrades without noise.
pub struct UnconfiguredCalendar;

#[async_trait]
impl CalendarProvider for UnconfiguredCalendar {
    async fn events_between(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        Ok(Vec::new())
    }
}

/// Reduced calendar view for the context snapshot.
#[derive(Debug, Clone, Default)]
pub struct CalendarSnapshot {
    pub upcoming_events: Vec<CalendarEvent>,
    pub current_event: Option<String>,
}

/// Gather up to three upcoming events in the next 24 hours sorted by start,
/// and the summary of any event whose window contains `now`.
pub async fn gather_calendar(
    provider: &dyn CalendarProvider,
    now: DateTime<Utc>,
) -> Result<CalendarSnapshot> {
    let window_end = now + Duration::hours(LOOKAHEAD_HOURS);
    let mut events = provider.events_between(now, window_end).await?;
    events.sort_by_key(|e| e.start);

    let current_event = events
        .iter()
        .find(|e| e.start <= now && now <= e.end)
        .map(|e| e.summary.clone());

    let upcoming_events = events.into_iter().take(MAX_UPCOMING).collect();

    Ok(CalendarSnapshot {
        upcoming_events,
        current_event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCalendar(Vec<CalendarEvent>);

    #[async_trait]
    impl CalendarProvider for FixedCalendar {
        async fn events_between(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>> {
            Ok(self.0.clone())
        }
    }

    fn event(summary: &str, start_offset_min: i64, duration_min: i64) -> CalendarEvent {
        let now = Utc::now();
        CalendarEvent {
            summary: summary.to_string(),
            start: now + Duration::minutes(start_offset_min),
            end: now + Duration::minutes(start_offset_min + duration_min),
        }
    }

    #[tokio::test]
    async fn test_caps_at_three_sorted_by_start() {
        let provider = FixedCalendar(vec![
            event("d", 240, 30),
            event("b", 60, 30),
            event("a", 30, 30),
            event("c", 120, 30),
        ]);
        let snap = gather_calendar(&provider, Utc::now()).await.unwrap();
        let names: Vec<&str> = snap.upcoming_events.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_current_event_detected() {
        let provider = FixedCalendar(vec![event("Standup", -10, 30), event("Later", 60, 30)]);
        let snap = gather_calendar(&provider, Utc::now()).await.unwrap();
        assert_eq!(snap.current_event.as_deref(), Some("Standup"));
    }

    #[tokio::test]
    async fn test_no_current_event() {
        let provider = FixedCalendar(vec![event("Later", 60, 30)]);
        let snap = gather_calendar(&provider, Utc::now()).await.unwrap();
        assert!(snap.current_event.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_is_empty() {
        let snap = gather_calendar(&UnconfiguredCalendar, Utc::now())
            .await
            .unwrap();
        assert!(snap.upcoming_events.is_empty());
        assert!(snap.current_event.is_none());
    }
}
