//! Durable queue for insights deferred by the delivery gate.
//!
//! Rows expire after 24 hours. `drain()` is a single transaction: it
//! returns the live rows in priority order and deletes everything,
//! expired stragglers included.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::Result;
use crate::types::InterventionType;

/// Insights older than this are expired and never returned.
pub const EXPIRY_HOURS: i64 = 24;

/// A queued insight row.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedInsight {
    pub id: String,
    pub content: String,
    pub intervention_type: InterventionType,
    pub urgency: u8,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

fn insight_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<QueuedInsight> {
    Ok(QueuedInsight {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        intervention_type: row
            .try_get::<String, _>("intervention_type")?
            .parse()
            .unwrap_or(InterventionType::Advisory),
        urgency: row.try_get::<i64, _>("urgency")? as u8,
        reasoning: row.try_get("reasoning")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Persistent queue for proactive messages that could not be delivered.
#[derive(Clone)]
pub struct InsightQueue {
    db: SqlitePool,
}

impl InsightQueue {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Add an insight to the queue.
    pub async fn enqueue(
        &self,
        content: &str,
        intervention_type: InterventionType,
        urgency: u8,
        reasoning: &str,
    ) -> Result<QueuedInsight> {
        let insight = QueuedInsight {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            intervention_type,
            urgency,
            reasoning: reasoning.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO queued_insights (id, content, intervention_type, urgency, reasoning, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&insight.id)
        .bind(&insight.content)
        .bind(insight.intervention_type.to_string())
        .bind(insight.urgency as i64)
        .bind(&insight.reasoning)
        .bind(insight.created_at)
        .execute(&self.db)
        .await?;

        tracing::info!(
            intervention_type = %insight.intervention_type,
            urgency = insight.urgency,
            "Queued insight"
        );
        Ok(insight)
    }

    /// Return all non-expired rows ordered by urgency desc then age, and
    /// delete every row (fresh and expired) in the same transaction.
    pub async fn drain(&self) -> Result<Vec<QueuedInsight>> {
        let cutoff = expiry_cutoff(Utc::now());
        let mut tx = self.db.begin().await?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM queued_insights
            WHERE created_at > ?
            ORDER BY urgency DESC, created_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM queued_insights")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let items = rows
            .iter()
            .map(insight_from_row)
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(count = items.len(), "Drained insight queue");
        Ok(items)
    }

    /// Count non-expired rows.
    pub async fn count(&self) -> Result<i64> {
        let cutoff = expiry_cutoff(Utc::now());
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM queued_insights WHERE created_at > ?")
                .bind(cutoff)
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    /// Preview up to `limit` rows in drain order without removing them.
    pub async fn peek(&self, limit: i64) -> Result<Vec<QueuedInsight>> {
        let cutoff = expiry_cutoff(Utc::now());
        let rows = sqlx::query(
            r#"
            SELECT * FROM queued_insights
            WHERE created_at > ?
            ORDER BY urgency DESC, created_at ASC
            LIMIT ?
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(insight_from_row).collect()
    }
}

/// Rows at or before this instant are expired. Strict-greater filtering on
/// `created_at` means the exact 24-hour boundary is excluded.
fn expiry_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(EXPIRY_HOURS)
}
