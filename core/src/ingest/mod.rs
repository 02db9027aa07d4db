//! Operator-side file intake: modality classification and batch upload.

pub mod modality;
pub mod upload;

pub use modality::classify_modality;
pub use upload::{UploadCoordinator, UploadError};
