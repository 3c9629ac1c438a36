//! Long-term memory capability and the soul file.
//!
//! The vector store itself is an external collaborator; the core only
//! needs search and store. The soul file is a markdown identity document
//! kept in the workspace and updated by consolidation.

pub mod soul;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

pub use soul::SoulFile;

/// Category of a stored memory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Fact,
    Preference,
    Pattern,
    Goal,
    Reflection,
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryCategory::Fact => write!(f, "fact"),
            MemoryCategory::Preference => write!(f, "preference"),
            MemoryCategory::Pattern => write!(f, "pattern"),
            MemoryCategory::Goal => write!(f, "goal"),
            MemoryCategory::Reflection => write!(f, "reflection"),
        }
    }
}

/// A memory returned from search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub content: String,
    pub category: MemoryCategory,
}

/// External long-term memory collaborator.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Top-k semantic search.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<MemoryItem>>;

    /// Store one memory.
    async fn store(
        &self,
        content: &str,
        category: MemoryCategory,
        source_session_id: Option<&str>,
    ) -> Result<()>;
}

/// Store used when no memory backend is wired in.
pub struct NoMemory;

#[async_trait]
impl MemoryStore for NoMemory {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<MemoryItem>> {
        Ok(Vec::new())
    }

    async fn store(
        &self,
        _content: &str,
        _category: MemoryCategory,
        _source_session_id: Option<&str>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Format search results as a prompt-ready bullet list.
pub fn format_memories(items: &[MemoryItem]) -> String {
    items
        .iter()
        .map(|item| format!("- [{}] {}", item.category, item.content))
        .collect::<Vec<_>>()
        .join("\n")
}
