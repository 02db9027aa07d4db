use crate::ingest::modality::classify_modality;
use crate::model::{File, LocalFile};
use crate::prelude::ClientError;
use crate::telemetry::LogManager;
use crate::tracking::PollingEngine;

/// A single file the remote service did not accept.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("upload of {file} failed: {cause}")]
pub struct UploadError {
    pub file: String,
    pub cause: ClientError,
}

/// Submits operator batches one file at a time.
///
/// A failed file never aborts the rest of the batch, and nothing is retried.
pub struct UploadCoordinator {
    engine: PollingEngine,
    logger: LogManager,
}

impl UploadCoordinator {
    pub fn new(engine: PollingEngine) -> Self {
        Self {
            engine,
            logger: LogManager::new("upload"),
        }
    }

    /// Uploads `files` in order and returns one result per file, in the same
    /// order. A non-empty batch is followed by exactly one refresh.
    pub async fn upload(&self, files: &[LocalFile]) -> Vec<Result<File, UploadError>> {
        if files.is_empty() {
            return Vec::new();
        }

        let service = self.engine.service();
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let modality = classify_modality(&file.name);
            let outcome = service.upload(file, modality).await.map_err(|cause| UploadError {
                file: file.name.clone(),
                cause,
            });
            match &outcome {
                Ok(record) => self.logger.record(&format!(
                    "uploaded {} as {} ({})",
                    file.name, record.id, modality
                )),
                Err(err) => self.logger.warn(&err.to_string()),
            }
            results.push(outcome);
        }

        let failed = results.iter().filter(|result| result.is_err()).count();
        self.logger.record(&format!(
            "batch finished: {} uploaded, {} failed",
            results.len() - failed,
            failed
        ));
        self.engine.refresh_after("upload batch").await;
        results
    }
}
