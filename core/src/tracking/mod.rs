//! Job lifecycle tracking: the snapshot registry and the engine that feeds it.

pub mod engine;
pub mod registry;

pub use engine::{PollingEngine, PollingHandle, DEFAULT_POLL_INTERVAL};
pub use registry::{JobRegistry, Snapshot};
