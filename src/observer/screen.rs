//! Screen observation log: append-only rows from the sensor with
//! back-filled durations, plus daily/weekly aggregation.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::Result;
use crate::types::ActivityType;

/// A stored observation.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenObservation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub app_name: String,
    pub window_title: String,
    pub activity_type: ActivityType,
    pub project: Option<String>,
    pub summary: Option<String>,
    pub details_json: Option<String>,
    pub blocked: bool,
    pub duration_seconds: Option<i64>,
}

/// Input for a new observation, as posted by the sensor.
#[derive(Debug, Clone, Default)]
pub struct NewObservation {
    pub app_name: String,
    pub window_title: String,
    pub activity_type: ActivityType,
    pub project: Option<String>,
    pub summary: Option<String>,
    pub details: Option<Vec<String>>,
    pub blocked: bool,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A consecutive same-activity run.
#[derive(Debug, Clone, Serialize)]
pub struct FocusStreak {
    pub activity: ActivityType,
    pub duration_minutes: i64,
    pub started_at: DateTime<Utc>,
}

/// Aggregates for a single day.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_observations: usize,
    pub total_tracked_minutes: i64,
    pub switch_count: usize,
    /// (name, seconds) pairs sorted by descending time.
    pub by_activity: Vec<(String, i64)>,
    pub by_project: Vec<(String, i64)>,
    pub by_app: Vec<(String, i64)>,
    pub longest_streaks: Vec<FocusStreak>,
}

/// One day's line inside a weekly summary.
#[derive(Debug, Clone, Serialize)]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub observations: usize,
    pub tracked_minutes: i64,
}

/// Aggregates for a 7-day window.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_observations: usize,
    pub total_tracked_minutes: i64,
    pub by_activity: Vec<(String, i64)>,
    pub by_project: Vec<(String, i64)>,
    pub daily_breakdown: Vec<DailyBreakdown>,
}

fn observation_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ScreenObservation> {
    Ok(ScreenObservation {
        id: row.try_get("id")?,
        timestamp: row.try_get("timestamp")?,
        app_name: row.try_get("app_name")?,
        window_title: row.try_get("window_title")?,
        activity_type: row
            .try_get::<String, _>("activity_type")?
            .parse()
            .unwrap_or(ActivityType::Other),
        project: row.try_get("project")?,
        summary: row.try_get("summary")?,
        details_json: row.try_get("details_json")?,
        blocked: row.try_get::<i64, _>("blocked")? != 0,
        duration_seconds: row.try_get("duration_seconds")?,
    })
}

/// CRUD and aggregation for screen observations.
#[derive(Clone)]
pub struct ScreenObservationRepository {
    db: SqlitePool,
}

impl ScreenObservationRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a new observation and back-fill the previous row's duration.
    ///
    /// Both writes happen in one transaction: the latest row always has a
    /// NULL duration, and the prior open row receives
    /// `floor(new_ts - prior_ts)` seconds.
    pub async fn create(&self, new: NewObservation) -> Result<ScreenObservation> {
        let now = new.timestamp.unwrap_or_else(Utc::now);
        let details_json = match &new.details {
            Some(details) => Some(serde_json::to_string(details)?),
            None => None,
        };

        let obs = ScreenObservation {
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            app_name: new.app_name,
            window_title: new.window_title,
            activity_type: new.activity_type,
            project: new.project,
            summary: new.summary,
            details_json,
            blocked: new.blocked,
            duration_seconds: None,
        };

        let mut tx = self.db.begin().await?;

        // Back-fill the most recent open row preceding this one.
        let prior = sqlx::query(
            r#"
            SELECT id, timestamp FROM screen_observations
            WHERE duration_seconds IS NULL AND timestamp < ?
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = prior {
            let prior_id: String = row.try_get("id")?;
            let prior_ts: DateTime<Utc> = row.try_get("timestamp")?;
            let duration = (now - prior_ts).num_seconds();
            sqlx::query("UPDATE screen_observations SET duration_seconds = ? WHERE id = ?")
                .bind(duration)
                .bind(&prior_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO screen_observations
                (id, timestamp, app_name, window_title, activity_type, project, summary, details_json, blocked, duration_seconds)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&obs.id)
        .bind(obs.timestamp)
        .bind(&obs.app_name)
        .bind(&obs.window_title)
        .bind(obs.activity_type.to_string())
        .bind(&obs.project)
        .bind(&obs.summary)
        .bind(&obs.details_json)
        .bind(obs.blocked as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(obs)
    }

    /// Non-blocked observations within a day, oldest first.
    async fn day_observations(&self, date: NaiveDate) -> Result<Vec<ScreenObservation>> {
        let start = date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
            .and_utc();
        let end = start + Duration::days(1);

        let rows = sqlx::query(
            r#"
            SELECT * FROM screen_observations
            WHERE timestamp >= ? AND timestamp < ? AND blocked = 0
            ORDER BY timestamp ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(observation_from_row).collect()
    }

    /// Aggregate observations for a single day.
    pub async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary> {
        let observations = self.day_observations(date).await?;

        let mut by_activity: Vec<(String, i64)> = Vec::new();
        let mut by_project: Vec<(String, i64)> = Vec::new();
        let mut by_app: Vec<(String, i64)> = Vec::new();
        let mut total_tracked_secs = 0i64;

        for obs in &observations {
            let duration = obs.duration_seconds.unwrap_or(0);
            total_tracked_secs += duration;

            bump(&mut by_activity, &obs.activity_type.to_string(), duration);
            if let Some(project) = &obs.project {
                bump(&mut by_project, project, duration);
            }
            bump(&mut by_app, &obs.app_name, duration);
        }

        by_activity.sort_by_key(|(_, secs)| -secs);
        by_project.sort_by_key(|(_, secs)| -secs);
        by_app.sort_by_key(|(_, secs)| -secs);

        let mut streaks = compute_streaks(&observations);
        streaks.truncate(3);

        Ok(DailySummary {
            date,
            total_observations: observations.len(),
            total_tracked_minutes: total_tracked_secs / 60,
            switch_count: observations.len(),
            by_activity,
            by_project,
            by_app,
            longest_streaks: streaks,
        })
    }

    /// Aggregate observations for the 7-day window starting at `week_start`.
    pub async fn weekly_summary(&self, week_start: NaiveDate) -> Result<WeeklySummary> {
        let mut combined_activity: Vec<(String, i64)> = Vec::new();
        let mut combined_project: Vec<(String, i64)> = Vec::new();
        let mut daily_breakdown = Vec::new();
        let mut total_observations = 0;
        let mut total_minutes = 0;

        for offset in 0..7 {
            let day = week_start + Duration::days(offset);
            let daily = self.daily_summary(day).await?;
            total_observations += daily.total_observations;
            total_minutes += daily.total_tracked_minutes;

            for (activity, secs) in &daily.by_activity {
                bump(&mut combined_activity, activity, *secs);
            }
            for (project, secs) in &daily.by_project {
                bump(&mut combined_project, project, *secs);
            }

            daily_breakdown.push(DailyBreakdown {
                date: day,
                observations: daily.total_observations,
                tracked_minutes: daily.total_tracked_minutes,
            });
        }

        combined_activity.sort_by_key(|(_, secs)| -secs);
        combined_project.sort_by_key(|(_, secs)| -secs);

        Ok(WeeklySummary {
            week_start,
            week_end: week_start + Duration::days(6),
            total_observations,
            total_tracked_minutes: total_minutes,
            by_activity: combined_activity,
            by_project: combined_project,
            daily_breakdown,
        })
    }

    /// Delete observations older than `retention_days`. Returns the number
    /// of rows removed.
    pub async fn cleanup_old(&self, retention_days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        let result = sqlx::query("DELETE FROM screen_observations WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.db)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(deleted, retention_days, "Cleaned up old screen observations");
        }
        Ok(deleted)
    }
}

fn bump(entries: &mut Vec<(String, i64)>, key: &str, amount: i64) {
    match entries.iter_mut().find(|(name, _)| name == key) {
        Some((_, total)) => *total += amount,
        None => entries.push((key.to_string(), amount)),
    }
}

/// Collapse consecutive same-activity observations into streaks, longest
/// first.
fn compute_streaks(observations: &[ScreenObservation]) -> Vec<FocusStreak> {
    let Some(first) = observations.first() else {
        return Vec::new();
    };

    let mut streaks = Vec::new();
    let mut current_activity = first.activity_type;
    let mut streak_start = first.timestamp;
    let mut streak_secs = first.duration_seconds.unwrap_or(0);

    for obs in &observations[1..] {
        if obs.activity_type == current_activity {
            streak_secs += obs.duration_seconds.unwrap_or(0);
        } else {
            if streak_secs > 0 {
                streaks.push(FocusStreak {
                    activity: current_activity,
                    duration_minutes: streak_secs / 60,
                    started_at: streak_start,
                });
            }
            current_activity = obs.activity_type;
            streak_start = obs.timestamp;
            streak_secs = obs.duration_seconds.unwrap_or(0);
        }
    }

    if streak_secs > 0 {
        streaks.push(FocusStreak {
            activity: current_activity,
            duration_minutes: streak_secs / 60,
            started_at: streak_start,
        });
    }

    streaks.sort_by_key(|s| -s.duration_minutes);
    streaks
}
