use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Sensor category of an uploaded file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Modality {
    #[serde(rename = "RGB")]
    Rgb,
    Thermal,
    Radar,
    #[serde(other)]
    Other,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Rgb => "RGB",
            Modality::Thermal => "Thermal",
            Modality::Radar => "Radar",
            Modality::Other => "Other",
        }
    }
}

impl From<&str> for Modality {
    /// Parses the wire name; anything unrecognised is `Other`.
    fn from(value: &str) -> Self {
        match value {
            "RGB" => Modality::Rgb,
            "Thermal" => Modality::Thermal,
            "Radar" => Modality::Radar,
            _ => Modality::Other,
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Client-side metadata sent alongside the upload payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    #[serde(rename = "lastModified")]
    pub last_modified: i64,
}

/// Cached copy of a file record owned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct File {
    pub id: String,
    pub filename: String,
    pub file_type: Modality,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<FileMetadata>,
}

/// A file picked by the operator that has not been submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, last_modified: i64) -> Self {
        Self {
            name: name.into(),
            bytes,
            last_modified,
        }
    }

    /// Loads a file from disk, keeping only its final path component as the name.
    pub async fn read<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let modified = tokio::fs::metadata(path).await?.modified()?;
        let last_modified = modified
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0);
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes, last_modified))
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: self.bytes.len() as u64,
            last_modified: self.last_modified,
        }
    }
}
