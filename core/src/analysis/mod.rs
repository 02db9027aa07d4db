//! Turns raw detection payloads into the confidence-classified view model.

pub mod aggregator;
pub mod target;
pub mod tier;

pub use aggregator::{
    summarize, DashboardStats, DetectionSummary, DetectionView, JobReport, TierBreakdown,
};
pub use target::{icon_for, TargetCategory};
pub use tier::ConfidenceTier;
