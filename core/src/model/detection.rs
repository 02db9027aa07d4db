use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target location in normalized `[0, 1]` image coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    /// Top-left corner as whole percentages of the image dimensions.
    pub fn position_percent(&self) -> (i64, i64) {
        (percent(self.x), percent(self.y))
    }
}

/// One recognized target inside a completed job's results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub target_type: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Detection {
    pub fn new(target_type: impl Into<String>, confidence: f64, bounding_box: BoundingBox) -> Self {
        Self {
            id: None,
            file_id: None,
            target_type: target_type.into(),
            confidence,
            bounding_box,
            timestamp: None,
        }
    }

    /// Confidence read-clamped to `[0, 1]`; non-finite payload values read as 0.
    pub fn clamped_confidence(&self) -> f64 {
        clamp_unit(self.confidence)
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn percent(value: f64) -> i64 {
    (clamp_unit(value) * 100.0).round() as i64
}
