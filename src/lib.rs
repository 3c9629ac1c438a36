//! Aegis - Proactive Personal-Assistant Runtime
//!
//! A long-running process that senses the user's context (time, calendar,
//! VCS activity, goals, screen), derives a coarse availability state, and
//! gates proactive messages through a budgeted delivery pipeline. Messages
//! that can't be delivered are queued and bundled on the next
//! blocked → unblocked transition.

pub mod broadcast;
pub mod config;
pub mod database;
pub mod error;
pub mod goals;
pub mod jobs;
pub mod llm;
pub mod memory;
pub mod observer;
pub mod profile;
pub mod runtime;
pub mod scheduler;
pub mod server;
pub mod sessions;
pub mod types;

// Re-export main types
pub use config::Settings;
pub use error::{Error, Result};
pub use runtime::{Runtime, RuntimeBuilder};

// Re-export the observer pipeline
pub use observer::{
    ContextManager, CurrentContext, DeliveryCoordinator, InsightQueue, ProactiveMessage,
    SensorPatch,
};

// Re-export the scheduler
pub use scheduler::Scheduler;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
