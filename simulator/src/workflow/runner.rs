use crate::generator::profile::synthesize_detections;
use crate::service::store::SharedStore;
use crate::workflow::config::SimulatorConfig;
use anyhow::Context;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Terminal outcome of one simulated analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { detections: usize },
    Failed,
}

/// Moves accepted jobs to a terminal state after the configured delay.
#[derive(Clone)]
pub struct Runner {
    config: SimulatorConfig,
    store: SharedStore,
    runs: Arc<AtomicU64>,
}

impl Runner {
    pub fn new(config: SimulatorConfig, store: SharedStore) -> Self {
        Self {
            config,
            store,
            runs: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Processes `job_id` in the background once the processing delay elapses.
    pub fn spawn(&self, job_id: String) {
        let runner = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(runner.config.processing_delay()).await;
            match runner.execute(&job_id) {
                Ok(outcome) => info!("job {job_id} finished: {outcome:?}"),
                Err(err) => warn!("job {job_id} could not be processed: {err:#}"),
            }
        });
    }

    pub fn execute(&self, job_id: &str) -> anyhow::Result<JobOutcome> {
        let mut store = self
            .store
            .write()
            .map_err(|_| anyhow::anyhow!("service store poisoned"))?;
        let job = store
            .job(job_id)
            .with_context(|| format!("looking up job {job_id}"))?;

        let missing: Vec<&String> = job
            .file_ids
            .iter()
            .filter(|id| !store.has_file(id))
            .collect();
        if self.config.fail_unknown_files && !missing.is_empty() {
            warn!("job {job_id} references unknown files {missing:?}");
            store.fail_job(job_id);
            return Ok(JobOutcome::Failed);
        }

        let run = self.runs.fetch_add(1, Ordering::Relaxed);
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(run));
        let detections: Vec<_> = job
            .file_ids
            .iter()
            .filter(|id| store.has_file(id))
            .flat_map(|id| {
                synthesize_detections(&mut rng, id, self.config.max_detections_per_file)
            })
            .collect();
        let count = detections.len();
        store.complete_job(job_id, detections);
        Ok(JobOutcome::Completed { detections: count })
    }
}
