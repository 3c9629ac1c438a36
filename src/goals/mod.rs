//! Goal repository capability.
//!
//! The goal store itself lives outside the core; jobs and context sources
//! reach it through this trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Paused,
    Abandoned,
}

/// A user goal as seen by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub domain: String,
    pub status: GoalStatus,
    pub due_date: Option<DateTime<Utc>>,
}

/// Per-domain progress counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainProgress {
    pub active: usize,
    pub completed: usize,
    pub total: usize,
}

/// Summary stats across all goals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalDashboard {
    pub domains: BTreeMap<String, DomainProgress>,
    pub active_count: usize,
    pub completed_count: usize,
    pub total_count: usize,
}

impl GoalDashboard {
    /// Completed share of all goals; zero when there are no goals.
    pub fn completion_ratio(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.completed_count as f64 / self.total_count as f64
        }
    }
}

/// External goal store collaborator.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// All goals with active status.
    async fn list_active(&self) -> Result<Vec<Goal>>;

    /// Summary stats for progress checks.
    async fn dashboard(&self) -> Result<GoalDashboard>;
}

/// Repository used when no goal store is wired in.
pub struct NoGoals;

#[async_trait]
impl GoalRepository for NoGoals {
    async fn list_active(&self) -> Result<Vec<Goal>> {
        Ok(Vec::new())
    }

    async fn dashboard(&self) -> Result<GoalDashboard> {
        Ok(GoalDashboard::default())
    }
}
