//! Session store capability.
//!
//! Conversation persistence lives outside the core; the consolidation job
//! only needs to find recently-active sessions and read their history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A conversation session as seen by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// External session persistence collaborator.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Sessions updated at or after `cutoff`, most recent first, capped at
    /// `limit`.
    async fn recently_updated(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SessionSummary>>;

    /// The session's conversation rendered as plain text, most recent
    /// `limit` messages.
    async fn history_text(&self, session_id: &str, limit: usize) -> Result<String>;
}

/// Store used when no session backend is wired in.
pub struct NoSessions;

#[async_trait]
impl SessionStore for NoSessions {
    async fn recently_updated(
        &self,
        _cutoff: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<SessionSummary>> {
        Ok(Vec::new())
    }

    async fn history_text(&self, _session_id: &str, _limit: usize) -> Result<String> {
        Ok(String::new())
    }
}
