//! Job-tracking and detection-aggregation core for the multispectral target
//! recognition client.
//!
//! Uploaded sensor files become analysis jobs on a remote service; this crate
//! polls that service, commits consistent snapshots to an in-memory registry
//! and turns raw detection payloads into a confidence-classified view model.

pub mod analysis;
pub mod ingest;
pub mod math;
pub mod model;
pub mod prelude;
pub mod remote;
pub mod telemetry;
pub mod tracking;

pub use prelude::{AnalysisService, ClientConfig, ClientError, ClientResult};
