//! Built-in task scheduler for the background jobs.
//!
//! Interval jobs (consolidation, goal check, calendar scan, strategist)
//! and wall-clock cron jobs (briefing, review, digests, cleanup) run on
//! `tokio-cron-scheduler`; cron triggers are evaluated in the user's
//! timezone. A tick whose previous invocation is still running is dropped
//! rather than queued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::jobs::{self, JobContext};

type JobFn = Arc<dyn Fn(Arc<JobContext>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

fn job_fn<F, Fut>(f: F) -> JobFn
where
    F: Fn(Arc<JobContext>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

enum Trigger {
    Every(Duration),
    Cron(String),
}

struct JobSpec {
    id: &'static str,
    trigger: Trigger,
    runner: JobFn,
}

/// Scheduler owning the background job set.
pub struct Scheduler {
    scheduler: JobScheduler,
    context: Arc<JobContext>,
    /// In-flight task per job id; used to coalesce overlapping ticks.
    running: Arc<Mutex<HashMap<&'static str, JoinHandle<()>>>>,
}

impl Scheduler {
    pub async fn new(context: Arc<JobContext>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| Error::Scheduler(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            context,
            running: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Register all configured jobs and start ticking.
    pub async fn start(&self) -> Result<()> {
        let settings = &self.context.settings;

        for spec in Self::job_specs(settings) {
            let job = self.build_job(spec)?;
            self.scheduler
                .add(job)
                .await
                .map_err(|e| Error::Scheduler(format!("Failed to add job: {e}")))?;
        }

        self.scheduler
            .start()
            .await
            .map_err(|e| Error::Scheduler(format!("Failed to start scheduler: {e}")))?;

        tracing::info!(
            timezone = %settings.timezone,
            "Scheduler started with {} jobs",
            Self::job_specs(settings).len()
        );
        Ok(())
    }

    /// Stop the scheduler and abort in-flight job tasks without waiting.
    pub async fn stop(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| Error::Scheduler(format!("Failed to stop scheduler: {e}")))?;

        let mut running = self.running.lock().expect("job registry lock");
        for (id, handle) in running.drain() {
            if !handle.is_finished() {
                tracing::debug!(job = id, "Aborting in-flight job task");
                handle.abort();
            }
        }

        tracing::info!("Scheduler stopped");
        Ok(())
    }

    fn job_specs(settings: &Settings) -> Vec<JobSpec> {
        vec![
            JobSpec {
                id: "memory_consolidation",
                trigger: Trigger::Every(Duration::from_secs(
                    settings.memory_consolidation_interval_min * 60,
                )),
                runner: job_fn(|ctx| async move { jobs::consolidation::run(&ctx).await }),
            },
            JobSpec {
                id: "goal_check",
                trigger: Trigger::Every(Duration::from_secs(
                    settings.goal_check_interval_hours * 3600,
                )),
                runner: job_fn(|ctx| async move { jobs::goal_check::run(&ctx).await }),
            },
            JobSpec {
                id: "calendar_scan",
                trigger: Trigger::Every(Duration::from_secs(
                    settings.calendar_scan_interval_min * 60,
                )),
                runner: job_fn(|ctx| async move { jobs::calendar_scan::run(&ctx).await }),
            },
            JobSpec {
                id: "strategist_tick",
                trigger: Trigger::Every(Duration::from_secs(
                    settings.strategist_interval_min * 60,
                )),
                runner: job_fn(|ctx| async move { jobs::strategist::run(&ctx).await }),
            },
            JobSpec {
                id: "daily_briefing",
                trigger: Trigger::Cron(format!("0 0 {} * * *", settings.morning_briefing_hour)),
                runner: job_fn(|ctx| async move { jobs::daily_briefing::run(&ctx).await }),
            },
            JobSpec {
                id: "evening_review",
                trigger: Trigger::Cron(format!("0 0 {} * * *", settings.evening_review_hour)),
                runner: job_fn(|ctx| async move { jobs::evening_review::run(&ctx).await }),
            },
            JobSpec {
                id: "activity_digest",
                trigger: Trigger::Cron(format!("0 0 {} * * *", settings.activity_digest_hour)),
                runner: job_fn(|ctx| async move { jobs::activity_digest::run(&ctx).await }),
            },
            JobSpec {
                id: "weekly_activity_review",
                trigger: Trigger::Cron(format!("0 0 {} * * Sun", settings.weekly_review_hour)),
                runner: job_fn(|ctx| async move { jobs::weekly_review::run(&ctx).await }),
            },
            JobSpec {
                id: "screen_cleanup",
                trigger: Trigger::Cron("0 0 3 * * *".to_string()),
                runner: job_fn(|ctx| async move { jobs::screen_cleanup::run(&ctx).await }),
            },
        ]
    }

    fn build_job(&self, spec: JobSpec) -> Result<Job> {
        let id = spec.id;
        let runner = spec.runner;
        let context = self.context.clone();
        let running = self.running.clone();

        let tick = move |_uuid: uuid::Uuid, _lock: JobScheduler| {
            let runner = runner.clone();
            let context = context.clone();
            let running = running.clone();
            Box::pin(async move {
                Self::tick(id, runner, context, running);
            }) as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        };

        let job = match spec.trigger {
            Trigger::Every(period) => Job::new_repeated_async(period, tick)
                .map_err(|e| Error::Scheduler(format!("Failed to create job {id}: {e}")))?,
            Trigger::Cron(expr) => {
                Job::new_async_tz(expr.as_str(), self.context.settings.timezone, tick)
                    .map_err(|e| Error::Scheduler(format!("Failed to create job {id}: {e}")))?
            }
        };
        Ok(job)
    }

    /// One scheduler tick: spawn the job unless its previous invocation is
    /// still running (coalesce, never queue missed ticks).
    fn tick(
        id: &'static str,
        runner: JobFn,
        context: Arc<JobContext>,
        running: Arc<Mutex<HashMap<&'static str, JoinHandle<()>>>>,
    ) {
        let mut guard = running.lock().expect("job registry lock");
        if let Some(handle) = guard.get(id) {
            if !handle.is_finished() {
                tracing::debug!(job = id, "Previous invocation still running, dropping tick");
                return;
            }
        }

        tracing::debug!(job = id, "Running scheduled job");
        let handle = tokio::spawn(async move {
            if let Err(e) = runner(context).await {
                tracing::error!(job = id, error = %e, "Job failed");
            }
        });
        guard.insert(id, handle);
    }
}
