//! Shared domain enums for context state, delivery gating, and activity tracking.
//!
//! All enums serialize to snake_case strings; the same strings are used for
//! SQLite storage and the HTTP API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse availability state derived from context signals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    DeepWork,
    InMeeting,
    Transitioning,
    Available,
    Away,
    WindingDown,
}

impl UserState {
    /// States during which non-urgent, non-scheduled messages are queued.
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            UserState::DeepWork | UserState::InMeeting | UserState::Away
        )
    }

    /// States that complete a blocked → unblocked transition.
    pub fn is_unblocked(self) -> bool {
        matches!(self, UserState::Available | UserState::Transitioning)
    }
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserState::DeepWork => write!(f, "deep_work"),
            UserState::InMeeting => write!(f, "in_meeting"),
            UserState::Transitioning => write!(f, "transitioning"),
            UserState::Available => write!(f, "available"),
            UserState::Away => write!(f, "away"),
            UserState::WindingDown => write!(f, "winding_down"),
        }
    }
}

/// How aggressively proactive messages may interrupt the user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionMode {
    Focus,
    Balanced,
    Active,
}

impl fmt::Display for InterruptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptionMode::Focus => write!(f, "focus"),
            InterruptionMode::Balanced => write!(f, "balanced"),
            InterruptionMode::Active => write!(f, "active"),
        }
    }
}

impl std::str::FromStr for InterruptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(InterruptionMode::Focus),
            "balanced" => Ok(InterruptionMode::Balanced),
            "active" => Ok(InterruptionMode::Active),
            _ => Err(format!("Invalid interruption mode: {}", s)),
        }
    }
}

/// Sensor-side capture policy; persisted and served to the sensor, not
/// otherwise consumed by the core
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    OnSwitch,
    Balanced,
    Detailed,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::OnSwitch => write!(f, "on_switch"),
            CaptureMode::Balanced => write!(f, "balanced"),
            CaptureMode::Detailed => write!(f, "detailed"),
        }
    }
}

impl std::str::FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_switch" => Ok(CaptureMode::OnSwitch),
            "balanced" => Ok(CaptureMode::Balanced),
            "detailed" => Ok(CaptureMode::Detailed),
            _ => Err(format!("Invalid capture mode: {}", s)),
        }
    }
}

/// Kind of proactive message being surfaced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    Nudge,
    Advisory,
    Alert,
    Ambient,
    ProactiveBundle,
}

impl fmt::Display for InterventionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterventionType::Nudge => write!(f, "nudge"),
            InterventionType::Advisory => write!(f, "advisory"),
            InterventionType::Alert => write!(f, "alert"),
            InterventionType::Ambient => write!(f, "ambient"),
            InterventionType::ProactiveBundle => write!(f, "proactive_bundle"),
        }
    }
}

impl std::str::FromStr for InterventionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nudge" => Ok(InterventionType::Nudge),
            "advisory" => Ok(InterventionType::Advisory),
            "alert" => Ok(InterventionType::Alert),
            "ambient" => Ok(InterventionType::Ambient),
            "proactive_bundle" => Ok(InterventionType::ProactiveBundle),
            _ => Err(format!("Invalid intervention type: {}", s)),
        }
    }
}

/// Outcome of the delivery gate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryDecision {
    Deliver,
    Queue,
    Drop,
}

impl fmt::Display for DeliveryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryDecision::Deliver => write!(f, "deliver"),
            DeliveryDecision::Queue => write!(f, "queue"),
            DeliveryDecision::Drop => write!(f, "drop"),
        }
    }
}

/// Time-of-day classification band
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Classify a local hour: [5,12) morning, [12,17) afternoon,
    /// [17,21) evening, else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn is_wind_down(self) -> bool {
        matches!(self, TimeOfDay::Evening | TimeOfDay::Night)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDay::Morning => write!(f, "morning"),
            TimeOfDay::Afternoon => write!(f, "afternoon"),
            TimeOfDay::Evening => write!(f, "evening"),
            TimeOfDay::Night => write!(f, "night"),
        }
    }
}

/// What kind of work a screen observation captured
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Coding,
    Browsing,
    Communication,
    Reading,
    Design,
    Terminal,
    Entertainment,
    #[default]
    Other,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Coding => write!(f, "coding"),
            ActivityType::Browsing => write!(f, "browsing"),
            ActivityType::Communication => write!(f, "communication"),
            ActivityType::Reading => write!(f, "reading"),
            ActivityType::Design => write!(f, "design"),
            ActivityType::Terminal => write!(f, "terminal"),
            ActivityType::Entertainment => write!(f, "entertainment"),
            ActivityType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coding" => Ok(ActivityType::Coding),
            "browsing" => Ok(ActivityType::Browsing),
            "communication" => Ok(ActivityType::Communication),
            "reading" => Ok(ActivityType::Reading),
            "design" => Ok(ActivityType::Design),
            "terminal" => Ok(ActivityType::Terminal),
            "entertainment" => Ok(ActivityType::Entertainment),
            "other" => Ok(ActivityType::Other),
            _ => Err(format!("Invalid activity type: {}", s)),
        }
    }
}

/// How many context sources succeeded on the last refresh
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Good,
    Degraded,
    Stale,
}

impl DataQuality {
    /// Derive quality from source success counts.
    pub fn from_counts(ok: usize, total: usize) -> Self {
        if ok == total {
            DataQuality::Good
        } else if ok == 0 {
            DataQuality::Stale
        } else {
            DataQuality::Degraded
        }
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQuality::Good => write!(f, "good"),
            DataQuality::Degraded => write!(f, "degraded"),
            DataQuality::Stale => write!(f, "stale"),
        }
    }
}
