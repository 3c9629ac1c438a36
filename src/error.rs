//! Error types for Aegis

use thiserror::Error;

/// Main error type for Aegis
#[derive(Debug, Error)]
pub enum Error {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input (bad enum value, malformed parameter)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// Context source errors (calendar, reflog, goals)
    #[error("Source error: {0}")]
    Source(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQL errors
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Reqwest HTTP client errors
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Aegis operations
pub type Result<T> = std::result::Result<T, Error>;
