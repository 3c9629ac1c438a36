//! Top-level runtime: constructs every component once and wires them
//! together. Collaborators (LLM, memory, goals, sessions, calendar) are
//! injected through their capability traits, so tests swap in fakes with
//! the same builder.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broadcast::Broadcaster;
use crate::config::Settings;
use crate::database::Database;
use crate::error::Result;
use crate::goals::{GoalRepository, NoGoals};
use crate::jobs::JobContext;
use crate::llm::{HttpLlmClient, LLMClient};
use crate::memory::{MemoryStore, NoMemory, SoulFile};
use crate::observer::sources::{CalendarProvider, ContextSource, UnconfiguredCalendar};
use crate::observer::{
    ContextManager, DeliveryCoordinator, InsightQueue, ScreenObservationRepository,
};
use crate::profile::UserProfileRepository;
use crate::scheduler::Scheduler;
use crate::server::{self, AppState};
use crate::sessions::{NoSessions, SessionStore};

/// The assembled assistant runtime.
pub struct Runtime {
    pub settings: Settings,
    pub database: Database,
    pub context: Arc<ContextManager>,
    pub delivery: Arc<DeliveryCoordinator>,
    pub broadcaster: Arc<Broadcaster>,
    pub queue: InsightQueue,
    pub screen: ScreenObservationRepository,
    pub profile: UserProfileRepository,

    job_context: Arc<JobContext>,
    scheduler: Option<Scheduler>,
    bundle_task: JoinHandle<()>,
}

impl Runtime {
    pub fn builder(settings: Settings) -> RuntimeBuilder {
        RuntimeBuilder::new(settings)
    }

    /// Start the background scheduler if enabled.
    pub async fn start_scheduler(&mut self) -> Result<()> {
        if !self.settings.scheduler_enabled {
            tracing::info!("Scheduler disabled (SCHEDULER_ENABLED=false)");
            return Ok(());
        }

        let mut scheduler = Scheduler::new(self.job_context.clone()).await?;
        scheduler.start().await?;
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Run the HTTP server on the configured host/port. Blocks until the
    /// server exits.
    pub async fn serve(&self) -> Result<()> {
        let state = AppState {
            context: self.context.clone(),
            screen: self.screen.clone(),
            profile: self.profile.clone(),
            broadcaster: self.broadcaster.clone(),
        };
        server::run(state, &self.settings.host, self.settings.port).await
    }

    /// Shared job capabilities, for driving jobs directly (tests, CLI).
    pub fn job_context(&self) -> Arc<JobContext> {
        self.job_context.clone()
    }

    /// Stop the scheduler, cancel the bundle task, and close persistence.
    /// In-flight jobs are aborted, not awaited.
    pub async fn shutdown(&mut self) {
        if let Some(scheduler) = &mut self.scheduler {
            if let Err(e) = scheduler.stop().await {
                tracing::warn!(error = %e, "Scheduler shutdown failed");
            }
        }
        self.bundle_task.abort();
        self.database.close().await;
        tracing::info!("Runtime shut down");
    }
}

/// Builder wiring collaborators into a `Runtime`.
pub struct RuntimeBuilder {
    settings: Settings,
    database: Option<Database>,
    llm: Option<Arc<dyn LLMClient>>,
    memory: Option<Arc<dyn MemoryStore>>,
    goals: Option<Arc<dyn GoalRepository>>,
    sessions: Option<Arc<dyn SessionStore>>,
    calendar: Option<Arc<dyn CalendarProvider>>,
}

impl RuntimeBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            database: None,
            llm: None,
            memory: None,
            goals: None,
            sessions: None,
            calendar: None,
        }
    }

    /// Use an already-open database (tests pass a single-connection
    /// in-memory pool here).
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LLMClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn goals(mut self, goals: Arc<dyn GoalRepository>) -> Self {
        self.goals = Some(goals);
        self
    }

    pub fn sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn calendar(mut self, calendar: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Build and wire the runtime: open the database, restore the profile,
    /// assemble the observer pipeline, and spawn the transition-drain task.
    pub async fn build(self) -> Result<Runtime> {
        let settings = self.settings;

        let database = match self.database {
            Some(database) => database,
            None => Database::new(&settings.database_url).await?,
        };
        database.initialize().await?;
        let pool = database.pool().clone();

        let queue = InsightQueue::new(pool.clone());
        let screen = ScreenObservationRepository::new(pool.clone());
        let profile = UserProfileRepository::new(pool);

        let llm: Arc<dyn LLMClient> = self
            .llm
            .unwrap_or_else(|| Arc::new(HttpLlmClient::from_settings(&settings)));
        let memory: Arc<dyn MemoryStore> = self.memory.unwrap_or_else(|| Arc::new(NoMemory));
        let goals: Arc<dyn GoalRepository> = self.goals.unwrap_or_else(|| Arc::new(NoGoals));
        let sessions: Arc<dyn SessionStore> = self.sessions.unwrap_or_else(|| Arc::new(NoSessions));
        let calendar: Arc<dyn CalendarProvider> =
            self.calendar.unwrap_or_else(|| Arc::new(UnconfiguredCalendar));

        let sources = vec![
            ContextSource::Time,
            ContextSource::Calendar(calendar),
            ContextSource::Vcs(PathBuf::from(settings.vcs_repo_or_workspace())),
            ContextSource::Goals(goals.clone()),
        ];

        let (transition_tx, mut transition_rx) = mpsc::unbounded_channel();
        let context = Arc::new(ContextManager::new(
            settings.clone(),
            sources,
            transition_tx,
        ));

        let stored_profile = profile.load().await?;
        context
            .restore_profile(stored_profile.interruption_mode, stored_profile.capture_mode)
            .await;

        let broadcaster = Arc::new(Broadcaster::new());
        let delivery = Arc::new(DeliveryCoordinator::new(
            context.clone(),
            queue.clone(),
            broadcaster.clone(),
        ));

        // Drain-and-bundle task: fires once per transition epoch, skipping
        // epochs superseded by a newer transition.
        let bundle_task = {
            let context = context.clone();
            let delivery = delivery.clone();
            tokio::spawn(async move {
                while let Some(epoch) = transition_rx.recv().await {
                    if epoch != context.current_epoch() {
                        tracing::info!(
                            epoch,
                            current = context.current_epoch(),
                            "Skipping superseded bundle delivery"
                        );
                        continue;
                    }
                    if let Err(e) = delivery.deliver_queued_bundle().await {
                        tracing::error!(error = %e, "Failed to deliver queued bundle");
                    }
                }
            })
        };

        let soul = SoulFile::new(&settings.workspace_dir, &settings.soul_file);
        if let Err(e) = soul.ensure_exists() {
            tracing::warn!(error = %e, "Could not create soul file");
        }

        let job_context = Arc::new(JobContext {
            settings: settings.clone(),
            context: context.clone(),
            delivery: delivery.clone(),
            screen: screen.clone(),
            llm,
            memory,
            goals,
            sessions,
            soul,
        });

        Ok(Runtime {
            settings,
            database,
            context,
            delivery,
            broadcaster,
            queue,
            screen,
            profile,
            job_context,
            scheduler: None,
            bundle_task,
        })
    }
}
