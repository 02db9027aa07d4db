//! Wire types shared with the remote analysis service.

pub mod detection;
pub mod file;
pub mod job;

pub use detection::{BoundingBox, Detection};
pub use file::{File, FileMetadata, LocalFile, Modality};
pub use job::{AnalysisRequest, AnalysisType, Job, JobStatus};
