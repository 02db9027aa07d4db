use crate::analysis::target::TargetCategory;
use crate::analysis::tier::ConfidenceTier;
use crate::math::stats::StatsHelper;
use crate::model::{Detection, Job, JobStatus};
use crate::tracking::Snapshot;
use serde::Serialize;

/// Count and mean confidence over a detection set.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct DetectionSummary {
    pub count: usize,
    pub average_confidence: f64,
}

pub fn summarize(detections: &[Detection]) -> DetectionSummary {
    let confidences: Vec<f64> = detections
        .iter()
        .map(Detection::clamped_confidence)
        .collect();
    DetectionSummary {
        count: confidences.len(),
        average_confidence: StatsHelper::mean(&confidences),
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct TierBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierBreakdown {
    pub fn from_detections(detections: &[Detection]) -> Self {
        detections
            .iter()
            .fold(Self::default(), |mut breakdown, detection| {
                match ConfidenceTier::classify(detection.confidence) {
                    ConfidenceTier::High => breakdown.high += 1,
                    ConfidenceTier::Medium => breakdown.medium += 1,
                    ConfidenceTier::Low => breakdown.low += 1,
                }
                breakdown
            })
    }
}

/// Display-ready projection of a single detection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetectionView {
    pub target_type: String,
    pub category: TargetCategory,
    pub glyph: &'static str,
    pub confidence: f64,
    pub confidence_percent: i64,
    pub tier: ConfidenceTier,
    pub color: &'static str,
    pub position_percent: (i64, i64),
}

impl From<&Detection> for DetectionView {
    fn from(detection: &Detection) -> Self {
        let category = TargetCategory::from_target_type(&detection.target_type);
        let confidence = detection.clamped_confidence();
        let tier = ConfidenceTier::classify(confidence);
        Self {
            target_type: detection.target_type.clone(),
            category,
            glyph: category.glyph(),
            confidence,
            confidence_percent: (confidence * 100.0).round() as i64,
            tier,
            color: tier.color(),
            position_percent: detection.bounding_box.position_percent(),
        }
    }
}

/// Result view for one completed job.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobReport {
    pub job_id: String,
    pub file_count: usize,
    pub detections: Vec<DetectionView>,
    pub summary: DetectionSummary,
    pub tiers: TierBreakdown,
}

impl JobReport {
    /// Only completed jobs carry results; anything else yields `None`.
    pub fn for_job(job: &Job) -> Option<Self> {
        let detections = job.detections()?;
        Some(Self {
            job_id: job.id.clone(),
            file_count: job.file_ids.len(),
            detections: detections.iter().map(DetectionView::from).collect(),
            summary: summarize(detections),
            tiers: TierBreakdown::from_detections(detections),
        })
    }
}

/// Headline figures across the whole registry snapshot.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct DashboardStats {
    pub files: usize,
    pub completed_jobs: usize,
    pub total_detections: usize,
    pub average_confidence: f64,
}

impl DashboardStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let summary = summarize(snapshot.detections());
        Self {
            files: snapshot.files().len(),
            completed_jobs: snapshot
                .jobs()
                .iter()
                .filter(|job| job.status == JobStatus::Completed)
                .count(),
            total_detections: summary.count,
            average_confidence: summary.average_confidence,
        }
    }
}
