//! User state machine and delivery gate.
//!
//! Pure functions only: derivation and gating never touch external state,
//! so every rule here is unit-testable without a runtime.

use chrono::{DateTime, Duration, Utc};

use crate::types::{DeliveryDecision, InterruptionMode, InterventionType, TimeOfDay, UserState};

/// Calendar event keywords that indicate a focus block.
const FOCUS_KEYWORDS: [&str; 3] = ["focus", "deep work", "do not disturb"];

/// No interaction for longer than this means the user is away.
const AWAY_THRESHOLD_MINUTES: i64 = 30;

/// Signals feeding state derivation, read from the pre-refresh snapshot and
/// the freshly gathered sources.
#[derive(Debug, Clone)]
pub struct StateSignals<'a> {
    pub now: DateTime<Utc>,
    pub current_event: Option<&'a str>,
    pub previous_state: UserState,
    pub time_of_day: TimeOfDay,
    pub is_working_hours: bool,
    pub last_interaction: Option<DateTime<Utc>>,
    pub active_window: Option<&'a str>,
}

/// Derive user state from context signals.
///
/// Rules are evaluated top-down; the first match wins:
/// 1. Calendar focus block (event mentions focus / deep work / DND)
/// 2. In meeting (any current calendar event)
/// 3. Transitioning (previous state was blocked, event now cleared)
/// 4. Away (no interaction for more than 30 minutes)
/// 5. Winding down (evening or night)
/// 6. Available
pub fn derive_state(signals: &StateSignals) -> UserState {
    if let Some(event) = signals.current_event {
        let lowered = event.to_lowercase();
        if FOCUS_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            return UserState::DeepWork;
        }
        if !event.is_empty() {
            return UserState::InMeeting;
        }
    }

    if signals.previous_state.is_blocked() {
        return UserState::Transitioning;
    }

    if let Some(last) = signals.last_interaction {
        if signals.now - last > Duration::minutes(AWAY_THRESHOLD_MINUTES) {
            return UserState::Away;
        }
    }

    if signals.time_of_day.is_wind_down() {
        return UserState::WindingDown;
    }

    UserState::Available
}

/// Central decision gate for proactive message delivery.
pub fn should_deliver(
    user_state: UserState,
    interruption_mode: InterruptionMode,
    attention_budget_remaining: u32,
    urgency: u8,
    intervention_type: InterventionType,
    is_scheduled: bool,
) -> DeliveryDecision {
    // Urgent messages always go through
    if urgency >= 5 {
        return DeliveryDecision::Deliver;
    }

    // Scheduled messages (briefings, reviews) always go through
    if is_scheduled {
        return DeliveryDecision::Deliver;
    }

    if user_state.is_blocked() {
        return DeliveryDecision::Queue;
    }

    // Focus mode blocks everything except the urgent/scheduled cases above
    if interruption_mode == InterruptionMode::Focus {
        return DeliveryDecision::Queue;
    }

    // Winding down: only alerts go through
    if user_state == UserState::WindingDown {
        if intervention_type == InterventionType::Alert {
            return DeliveryDecision::Deliver;
        }
        return DeliveryDecision::Queue;
    }

    if should_cost_budget(intervention_type, is_scheduled, urgency) && attention_budget_remaining == 0
    {
        return DeliveryDecision::Queue;
    }

    DeliveryDecision::Deliver
}

/// Whether a delivery consumes attention budget.
///
/// Free: ambient, bundle, scheduled, and urgent (>= 5) messages.
pub fn should_cost_budget(
    intervention_type: InterventionType,
    is_scheduled: bool,
    urgency: u8,
) -> bool {
    if matches!(
        intervention_type,
        InterventionType::Ambient | InterventionType::ProactiveBundle
    ) {
        return false;
    }
    if is_scheduled {
        return false;
    }
    if urgency >= 5 {
        return false;
    }
    true
}

/// Default attention budget for an interruption mode.
pub fn default_budget(mode: InterruptionMode) -> u32 {
    match mode {
        InterruptionMode::Focus => 0,
        InterruptionMode::Balanced => 5,
        InterruptionMode::Active => 15,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(now: DateTime<Utc>) -> StateSignals<'static> {
        StateSignals {
            now,
            current_event: None,
            previous_state: UserState::Available,
            time_of_day: TimeOfDay::Morning,
            is_working_hours: true,
            last_interaction: None,
            active_window: None,
        }
    }

    #[test]
    fn test_focus_event_wins() {
        let now = Utc::now();
        let s = StateSignals {
            current_event: Some("Focus block"),
            ..signals(now)
        };
        assert_eq!(derive_state(&s), UserState::DeepWork);
    }

    #[test]
    fn test_focus_keyword_case_insensitive() {
        let now = Utc::now();
        for event in ["DEEP WORK sprint", "Do Not Disturb", "fOcUs time"] {
            let s = StateSignals {
                current_event: Some(event),
                ..signals(now)
            };
            assert_eq!(derive_state(&s), UserState::DeepWork, "event: {event}");
        }
    }

    #[test]
    fn test_any_event_means_meeting() {
        let now = Utc::now();
        let s = StateSignals {
            current_event: Some("1:1 with Sam"),
            ..signals(now)
        };
        assert_eq!(derive_state(&s), UserState::InMeeting);
    }

    #[test]
    fn test_event_dominates_idleness() {
        // A current event keeps the user in_meeting even if they have not
        // interacted for hours.
        let now = Utc::now();
        let s = StateSignals {
            current_event: Some("All-hands"),
            last_interaction: Some(now - Duration::hours(3)),
            ..signals(now)
        };
        assert_eq!(derive_state(&s), UserState::InMeeting);
    }

    #[test]
    fn test_blocked_to_clear_is_transitioning() {
        let now = Utc::now();
        for prev in [UserState::DeepWork, UserState::InMeeting, UserState::Away] {
            let s = StateSignals {
                previous_state: prev,
                ..signals(now)
            };
            assert_eq!(derive_state(&s), UserState::Transitioning, "prev: {prev}");
        }
    }

    #[test]
    fn test_idle_exactly_thirty_minutes_is_not_away() {
        let now = Utc::now();
        let s = StateSignals {
            last_interaction: Some(now - Duration::minutes(30)),
            ..signals(now)
        };
        assert_eq!(derive_state(&s), UserState::Available);
    }

    #[test]
    fn test_idle_past_thirty_minutes_is_away() {
        let now = Utc::now();
        let s = StateSignals {
            last_interaction: Some(now - Duration::minutes(30) - Duration::seconds(1)),
            ..signals(now)
        };
        assert_eq!(derive_state(&s), UserState::Away);
    }

    #[test]
    fn test_twenty_nine_minutes_is_not_away() {
        let now = Utc::now();
        let s = StateSignals {
            last_interaction: Some(now - Duration::minutes(29)),
            ..signals(now)
        };
        assert_eq!(derive_state(&s), UserState::Available);
    }

    #[test]
    fn test_evening_is_winding_down() {
        let now = Utc::now();
        for tod in [TimeOfDay::Evening, TimeOfDay::Night] {
            let s = StateSignals {
                time_of_day: tod,
                ..signals(now)
            };
            assert_eq!(derive_state(&s), UserState::WindingDown);
        }
    }

    #[test]
    fn test_default_is_available() {
        let now = Utc::now();
        assert_eq!(derive_state(&signals(now)), UserState::Available);
    }

    // ── Delivery gate ───────────────────────────────────────

    #[test]
    fn test_urgent_always_delivers() {
        let decision = should_deliver(
            UserState::DeepWork,
            InterruptionMode::Focus,
            0,
            5,
            InterventionType::Alert,
            false,
        );
        assert_eq!(decision, DeliveryDecision::Deliver);
    }

    #[test]
    fn test_scheduled_always_delivers() {
        let decision = should_deliver(
            UserState::DeepWork,
            InterruptionMode::Focus,
            0,
            2,
            InterventionType::Advisory,
            true,
        );
        assert_eq!(decision, DeliveryDecision::Deliver);
    }

    #[test]
    fn test_blocked_states_queue_non_urgent() {
        for state in [UserState::DeepWork, UserState::InMeeting, UserState::Away] {
            for urgency in 0..5 {
                let decision = should_deliver(
                    state,
                    InterruptionMode::Balanced,
                    5,
                    urgency,
                    InterventionType::Advisory,
                    false,
                );
                assert_eq!(decision, DeliveryDecision::Queue, "{state} u={urgency}");
            }
        }
    }

    #[test]
    fn test_focus_mode_queues_everything_unprivileged() {
        let decision = should_deliver(
            UserState::Available,
            InterruptionMode::Focus,
            5,
            4,
            InterventionType::Alert,
            false,
        );
        assert_eq!(decision, DeliveryDecision::Queue);
    }

    #[test]
    fn test_winding_down_lets_alerts_through() {
        let decision = should_deliver(
            UserState::WindingDown,
            InterruptionMode::Balanced,
            5,
            3,
            InterventionType::Alert,
            false,
        );
        assert_eq!(decision, DeliveryDecision::Deliver);

        let decision = should_deliver(
            UserState::WindingDown,
            InterruptionMode::Balanced,
            5,
            3,
            InterventionType::Advisory,
            false,
        );
        assert_eq!(decision, DeliveryDecision::Queue);
    }

    #[test]
    fn test_exhausted_budget_queues_costly_messages() {
        let decision = should_deliver(
            UserState::Available,
            InterruptionMode::Balanced,
            0,
            3,
            InterventionType::Advisory,
            false,
        );
        assert_eq!(decision, DeliveryDecision::Queue);
    }

    #[test]
    fn test_ambient_ignores_budget() {
        let decision = should_deliver(
            UserState::Available,
            InterruptionMode::Balanced,
            0,
            1,
            InterventionType::Ambient,
            false,
        );
        assert_eq!(decision, DeliveryDecision::Deliver);
    }

    #[test]
    fn test_available_with_budget_delivers() {
        let decision = should_deliver(
            UserState::Available,
            InterruptionMode::Balanced,
            3,
            3,
            InterventionType::Advisory,
            false,
        );
        assert_eq!(decision, DeliveryDecision::Deliver);
    }

    #[test]
    fn test_cost_budget_exemptions() {
        // Ambient and bundle messages never cost, for any urgency or flag.
        for scheduled in [true, false] {
            for urgency in 0..5 {
                assert!(!should_cost_budget(
                    InterventionType::Ambient,
                    scheduled,
                    urgency
                ));
                assert!(!should_cost_budget(
                    InterventionType::ProactiveBundle,
                    scheduled,
                    urgency
                ));
            }
        }
        assert!(!should_cost_budget(InterventionType::Advisory, true, 3));
        assert!(!should_cost_budget(InterventionType::Alert, false, 5));
        assert!(should_cost_budget(InterventionType::Advisory, false, 3));
        assert!(should_cost_budget(InterventionType::Nudge, false, 0));
    }

    #[test]
    fn test_default_budgets() {
        assert_eq!(default_budget(InterruptionMode::Focus), 0);
        assert_eq!(default_budget(InterruptionMode::Balanced), 5);
        assert_eq!(default_budget(InterruptionMode::Active), 15);
    }
}
