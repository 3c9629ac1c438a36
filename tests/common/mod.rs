//! Shared fixtures for integration tests: fake collaborators and a
//! runtime wired against in-memory SQLite.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use sqlx::sqlite::SqlitePoolOptions;

use aegis::database::Database;
use aegis::error::Result;
use aegis::goals::{Goal, GoalDashboard, GoalRepository};
use aegis::llm::{CompletionRequest, LLMClient};
use aegis::memory::{MemoryCategory, MemoryItem, MemoryStore};
use aegis::observer::sources::{CalendarEvent, CalendarProvider};
use aegis::sessions::{SessionStore, SessionSummary};
use aegis::{Runtime, Settings};

/// LLM fake returning a canned response and recording prompts.
pub struct FakeLlm {
    pub response: Mutex<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn returning(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LLMClient for FakeLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt);
        Ok(self.response.lock().unwrap().clone())
    }
}

/// Calendar fake whose event list tests mutate between refreshes.
#[derive(Default)]
pub struct SharedCalendar {
    pub events: Mutex<Vec<CalendarEvent>>,
}

impl SharedCalendar {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the event list with a single event running now.
    pub fn set_current_event(&self, summary: &str) {
        let now = Utc::now();
        *self.events.lock().unwrap() = vec![CalendarEvent {
            summary: summary.to_string(),
            start: now - Duration::minutes(5),
            end: now + Duration::minutes(25),
        }];
    }

    /// Replace the event list with one starting `minutes` from now.
    pub fn set_upcoming_event(&self, summary: &str, minutes: i64) {
        let now = Utc::now();
        *self.events.lock().unwrap() = vec![CalendarEvent {
            summary: summary.to_string(),
            start: now + Duration::minutes(minutes),
            end: now + Duration::minutes(minutes + 30),
        }];
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl CalendarProvider for SharedCalendar {
    async fn events_between(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        Ok(self.events.lock().unwrap().clone())
    }
}

/// Memory fake recording stores.
#[derive(Default)]
pub struct RecordingMemory {
    pub stored: Mutex<Vec<(String, MemoryCategory)>>,
}

#[async_trait]
impl MemoryStore for RecordingMemory {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<MemoryItem>> {
        Ok(vec![MemoryItem {
            content: "User prefers quiet mornings".to_string(),
            category: MemoryCategory::Preference,
        }])
    }

    async fn store(
        &self,
        content: &str,
        category: MemoryCategory,
        _source_session_id: Option<&str>,
    ) -> Result<()> {
        self.stored
            .lock()
            .unwrap()
            .push((content.to_string(), category));
        Ok(())
    }
}

/// Goal repository fake with a fixed dashboard.
pub struct FixedGoals {
    pub goals: Vec<Goal>,
    pub dashboard: GoalDashboard,
}

#[async_trait]
impl GoalRepository for FixedGoals {
    async fn list_active(&self) -> Result<Vec<Goal>> {
        Ok(self.goals.clone())
    }

    async fn dashboard(&self) -> Result<GoalDashboard> {
        Ok(self.dashboard.clone())
    }
}

/// Session store fake with one ready-to-consolidate session.
pub struct OneSession {
    pub history: String,
}

#[async_trait]
impl SessionStore for OneSession {
    async fn recently_updated(
        &self,
        _cutoff: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<SessionSummary>> {
        Ok(vec![SessionSummary {
            id: "session-1".to_string(),
            title: "Chat".to_string(),
            updated_at: Utc::now(),
        }])
    }

    async fn history_text(&self, _session_id: &str, _limit: usize) -> Result<String> {
        Ok(self.history.clone())
    }
}

/// A timezone in which the current wall-clock hour equals `target` (used
/// to pin the time-of-day classification regardless of when tests run).
pub fn tz_with_local_hour(target: u32) -> Tz {
    let utc_hour = Utc::now().hour() as i32;
    let mut diff = utc_hour - target as i32;
    if diff > 12 {
        diff -= 24;
    }
    if diff < -12 {
        diff += 24;
    }
    // Etc/GMT+N is UTC-N, so a positive diff shifts the local clock back.
    let name = if diff >= 0 {
        format!("Etc/GMT+{diff}")
    } else {
        format!("Etc/GMT{diff}")
    };
    name.parse().expect("Etc/GMT zone exists")
}

/// Settings pinned to mid-morning local time with a scratch workspace.
pub fn test_settings(workspace: &std::path::Path) -> Settings {
    let mut settings = Settings::default();
    settings.timezone = tz_with_local_hour(10);
    settings.scheduler_enabled = false;
    settings.workspace_dir = workspace.display().to_string();
    // Point the VCS source at the empty workspace so no host repo leaks in.
    settings.vcs_repo_path = workspace.display().to_string();
    settings
}

/// Open a single-connection in-memory database.
pub async fn test_database() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    Database::from_pool(pool)
}

/// Fully-wired runtime over fakes. Returns the runtime plus handles to
/// the fakes the tests poke at.
pub struct TestHarness {
    pub runtime: Runtime,
    pub calendar: Arc<SharedCalendar>,
    pub llm: Arc<FakeLlm>,
    pub memory: Arc<RecordingMemory>,
    pub _workspace: tempfile::TempDir,
}

pub async fn harness_with(llm_response: &str, goals: Option<FixedGoals>) -> TestHarness {
    let workspace = tempfile::TempDir::new().expect("tempdir");
    let settings = test_settings(workspace.path());

    let calendar = SharedCalendar::empty();
    let llm = FakeLlm::returning(llm_response);
    let memory = Arc::new(RecordingMemory::default());

    let mut builder = Runtime::builder(settings)
        .database(test_database().await)
        .calendar(calendar.clone())
        .llm(llm.clone())
        .memory(memory.clone())
        .sessions(Arc::new(OneSession {
            history: "user: hello, I'm Ada, a compiler engineer. Let's plan the week.".to_string(),
        }));
    if let Some(goals) = goals {
        builder = builder.goals(Arc::new(goals));
    }

    let runtime = builder.build().await.expect("runtime builds");

    TestHarness {
        runtime,
        calendar,
        llm,
        memory,
        _workspace: workspace,
    }
}

pub async fn harness() -> TestHarness {
    harness_with("ok", None).await
}
