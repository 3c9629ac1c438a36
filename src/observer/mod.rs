//! Observer subsystem: context sensing, state derivation, and delivery
//! gating.
//!
//! The pipeline runs sources → context manager → delivery coordinator →
//! broadcast/queue. The state machine in `state` is pure; everything with
//! side effects lives in `manager`, `queue`, `delivery`, and `screen`.

pub mod context;
pub mod delivery;
pub mod manager;
pub mod queue;
pub mod screen;
pub mod sources;
pub mod state;

pub use context::{CurrentContext, SensorPatch};
pub use delivery::{DeliveryCoordinator, ProactiveMessage};
pub use manager::ContextManager;
pub use queue::{InsightQueue, QueuedInsight};
pub use screen::{NewObservation, ScreenObservationRepository};
