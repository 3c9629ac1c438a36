//! User profile persistence: the singleton settings row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::types::{CaptureMode, InterruptionMode};

const SINGLETON_ID: &str = "singleton";

/// Durable user settings, restored into the in-memory context at startup.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub interruption_mode: InterruptionMode,
    pub capture_mode: CaptureMode,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for the singleton profile row.
#[derive(Clone)]
pub struct UserProfileRepository {
    db: SqlitePool,
}

impl UserProfileRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Load the profile, inserting the default row on first run.
    pub async fn load(&self) -> Result<UserProfile> {
        if let Some(profile) = self.fetch().await? {
            return Ok(profile);
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_profile (id, interruption_mode, capture_mode, onboarding_completed, created_at, updated_at)
            VALUES (?, 'balanced', 'balanced', 0, ?, ?)
            "#,
        )
        .bind(SINGLETON_ID)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        self.fetch().await?.ok_or_else(|| {
            crate::error::Error::Database("Profile row missing after insert".to_string())
        })
    }

    async fn fetch(&self) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT * FROM user_profile WHERE id = ?")
            .bind(SINGLETON_ID)
            .fetch_optional(&self.db)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(UserProfile {
            interruption_mode: row
                .try_get::<String, _>("interruption_mode")?
                .parse()
                .unwrap_or(InterruptionMode::Balanced),
            capture_mode: row
                .try_get::<String, _>("capture_mode")?
                .parse()
                .unwrap_or(CaptureMode::Balanced),
            onboarding_completed: row.try_get::<i64, _>("onboarding_completed")? != 0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    /// Persist a new interruption mode.
    pub async fn set_interruption_mode(&self, mode: InterruptionMode) -> Result<()> {
        self.load().await?;
        sqlx::query("UPDATE user_profile SET interruption_mode = ?, updated_at = ? WHERE id = ?")
            .bind(mode.to_string())
            .bind(Utc::now())
            .bind(SINGLETON_ID)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Persist a new capture mode.
    pub async fn set_capture_mode(&self, mode: CaptureMode) -> Result<()> {
        self.load().await?;
        sqlx::query("UPDATE user_profile SET capture_mode = ?, updated_at = ? WHERE id = ?")
            .bind(mode.to_string())
            .bind(Utc::now())
            .bind(SINGLETON_ID)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Mark onboarding complete. Safe to call repeatedly.
    pub async fn complete_onboarding(&self) -> Result<()> {
        self.load().await?;
        sqlx::query("UPDATE user_profile SET onboarding_completed = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(SINGLETON_ID)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_repo() -> UserProfileRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        UserProfileRepository::new(pool)
    }

    #[tokio::test]
    async fn test_load_creates_default_row() {
        let repo = test_repo().await;
        let profile = repo.load().await.unwrap();
        assert_eq!(profile.interruption_mode, InterruptionMode::Balanced);
        assert_eq!(profile.capture_mode, CaptureMode::Balanced);
        assert!(!profile.onboarding_completed);
    }

    #[tokio::test]
    async fn test_mode_round_trip() {
        let repo = test_repo().await;
        repo.set_interruption_mode(InterruptionMode::Focus)
            .await
            .unwrap();
        repo.set_capture_mode(CaptureMode::Detailed).await.unwrap();

        let profile = repo.load().await.unwrap();
        assert_eq!(profile.interruption_mode, InterruptionMode::Focus);
        assert_eq!(profile.capture_mode, CaptureMode::Detailed);
    }

    #[tokio::test]
    async fn test_double_onboarding_skip_is_idempotent() {
        let repo = test_repo().await;
        repo.complete_onboarding().await.unwrap();
        repo.complete_onboarding().await.unwrap();
        assert!(repo.load().await.unwrap().onboarding_completed);
    }
}
