use serde::Serialize;

/// Closed set of target categories the view model knows a glyph for.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetCategory {
    Vehicle,
    Person,
    Structure,
    Aircraft,
    Unknown,
}

impl TargetCategory {
    /// Case-insensitive match of the free-form `target_type` reported by the service.
    pub fn from_target_type(target_type: &str) -> Self {
        match target_type.trim().to_lowercase().as_str() {
            "vehicle" => TargetCategory::Vehicle,
            "person" | "people" => TargetCategory::Person,
            "building" | "structure" => TargetCategory::Structure,
            "aircraft" => TargetCategory::Aircraft,
            _ => TargetCategory::Unknown,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            TargetCategory::Vehicle => "🚗",
            TargetCategory::Person => "👤",
            TargetCategory::Structure => "🏢",
            TargetCategory::Aircraft => "✈️",
            TargetCategory::Unknown => "🎯",
        }
    }
}

pub fn icon_for(target_type: &str) -> &'static str {
    TargetCategory::from_target_type(target_type).glyph()
}
