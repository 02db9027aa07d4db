use crate::model::{AnalysisRequest, AnalysisType, Job};
use crate::prelude::{AnalysisService, ClientError, ClientResult};
use crate::telemetry::{CycleMetrics, LogManager, MetricsRecorder};
use crate::tracking::registry::{JobRegistry, Snapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Drives refresh cycles against the remote service and owns the only timer.
///
/// Every commit is tagged with the generation that was current when its
/// cycle was issued. `stop()` and `start()` advance the generation, so a
/// cycle still in flight when either is called resolves to
/// [`ClientError::StaleCommit`] and leaves the registry untouched.
#[derive(Clone)]
pub struct PollingEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    service: Arc<dyn AnalysisService>,
    registry: JobRegistry,
    state: Mutex<EngineState>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

#[derive(Default)]
struct EngineState {
    generation: u64,
    timer: Option<CancellationToken>,
    last_error: Option<ClientError>,
}

/// Cancellation handle returned by [`PollingEngine::start`].
pub struct PollingHandle {
    engine: PollingEngine,
    generation: u64,
}

impl PollingHandle {
    /// Stops the timer this handle started; a no-op once it was replaced or stopped.
    pub fn cancel(self) {
        self.engine.stop_generation(self.generation);
    }

    pub fn is_active(&self) -> bool {
        let state = self.engine.lock_state();
        state.timer.is_some() && state.generation == self.generation
    }
}

impl PollingEngine {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                service,
                registry: JobRegistry::new(),
                state: Mutex::new(EngineState::default()),
                metrics: MetricsRecorder::new(),
                logger: LogManager::new("polling"),
            }),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.inner.registry
    }

    pub fn service(&self) -> Arc<dyn AnalysisService> {
        self.inner.service.clone()
    }

    pub fn metrics(&self) -> CycleMetrics {
        self.inner.metrics.snapshot()
    }

    /// Most recent transient refresh failure, cleared by the next commit.
    pub fn last_error(&self) -> Option<ClientError> {
        self.lock_state().last_error.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().timer.is_some()
    }

    /// Refreshes immediately, then every `period` until stopped.
    ///
    /// Starting a running engine cancels the previous timer first. A zero
    /// period is raised to one millisecond. Must be called from within a
    /// Tokio runtime.
    pub fn start(&self, period: Duration) -> PollingHandle {
        let period = period.max(MIN_POLL_INTERVAL);
        let token = CancellationToken::new();
        let generation = {
            let mut state = self.lock_state();
            if let Some(previous) = state.timer.take() {
                previous.cancel();
                self.inner.logger.record("restarting polling timer");
            }
            state.generation += 1;
            state.timer = Some(token.clone());
            state.generation
        };

        let engine = self.clone();
        tokio::spawn(async move { engine.run_timer(period, generation, token).await });
        self.inner.logger.record(&format!(
            "polling every {} ms (generation {generation})",
            period.as_millis()
        ));

        PollingHandle {
            engine: self.clone(),
            generation,
        }
    }

    /// Clears the timer and invalidates every refresh currently in flight.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        state.generation += 1;
        if let Some(token) = state.timer.take() {
            token.cancel();
            self.inner.logger.record("polling stopped");
        }
    }

    fn stop_generation(&self, generation: u64) {
        let is_current = {
            let state = self.lock_state();
            state.timer.is_some() && state.generation == generation
        };
        if is_current {
            self.stop();
        }
    }

    /// Runs one out-of-band refresh cycle.
    pub async fn refresh(&self) -> ClientResult<Arc<Snapshot>> {
        let generation = self.lock_state().generation;
        self.run_cycle(generation).await
    }

    /// Submits a job over `file_ids`, then refreshes so the job is visible
    /// without waiting for the next tick. The follow-up refresh never fails
    /// the request.
    pub async fn request_analysis(
        &self,
        file_ids: &[String],
        analysis_type: AnalysisType,
    ) -> ClientResult<Job> {
        if file_ids.is_empty() {
            return Err(ClientError::InvalidRequest(
                "analysis needs at least one file id".into(),
            ));
        }
        if file_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ClientError::InvalidRequest("file ids must not be blank".into()));
        }

        let request = AnalysisRequest {
            file_ids: file_ids.to_vec(),
            analysis_type,
        };
        let job = self.inner.service.create_job(&request).await?;
        self.inner.logger.record(&format!(
            "analysis job {} accepted over {} file(s), status {}",
            job.id,
            job.file_ids.len(),
            job.status
        ));
        self.refresh_after("analysis request").await;
        Ok(job.normalized())
    }

    pub async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        if file_id.trim().is_empty() {
            return Err(ClientError::InvalidRequest("file id must not be blank".into()));
        }
        self.inner.service.delete_file(file_id).await?;
        self.inner.logger.record(&format!("file {file_id} deleted"));
        self.refresh_after("file deletion").await;
        Ok(())
    }

    pub(crate) async fn refresh_after(&self, reason: &str) {
        match self.refresh().await {
            Ok(_) => {}
            Err(err) if err.is_user_visible() => self
                .inner
                .logger
                .warn(&format!("refresh after {reason} failed: {err}")),
            Err(err) => self.inner.logger.debug(&format!("refresh after {reason}: {err}")),
        }
    }

    async fn run_timer(self, period: Duration, generation: u64, token: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            // Errors are recorded by the cycle; the next tick retries.
            let _ = self.run_cycle(generation).await;
        }
    }

    async fn run_cycle(&self, generation: u64) -> ClientResult<Arc<Snapshot>> {
        let service = &self.inner.service;
        let fetched = tokio::try_join!(
            service.list_files(),
            service.list_jobs(),
            service.list_detections()
        );

        let mut state = self.lock_state();
        if state.generation != generation {
            let current = state.generation;
            drop(state);
            self.inner.metrics.record_stale();
            let stale = ClientError::StaleCommit {
                issued: generation,
                current,
            };
            self.inner.logger.debug(&stale.to_string());
            return Err(stale);
        }

        match fetched {
            Ok((files, jobs, detections)) => {
                let snapshot = self
                    .inner
                    .registry
                    .replace(Snapshot::new(files, jobs, detections));
                state.last_error = None;
                drop(state);
                self.inner.metrics.record_committed();
                self.inner.logger.debug(&format!(
                    "committed {} files, {} jobs, {} detections",
                    snapshot.files().len(),
                    snapshot.jobs().len(),
                    snapshot.detections().len()
                ));
                Ok(snapshot)
            }
            Err(err) => {
                state.last_error = Some(err.clone());
                drop(state);
                self.inner.metrics.record_failed();
                self.inner
                    .logger
                    .warn(&format!("refresh cycle failed, keeping previous snapshot: {err}"));
                Err(err)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::{Endpoint, FakeService};
    use crate::model::JobStatus;

    fn engine_with(fake: &Arc<FakeService>) -> PollingEngine {
        PollingEngine::new(fake.clone())
    }

    #[tokio::test]
    async fn refresh_commits_all_three_listings() {
        let fake = Arc::new(FakeService::new());
        fake.seed_file("f1", "scene.png");
        fake.seed_detection("vehicle", 0.9);
        let engine = engine_with(&fake);

        let snapshot = engine.refresh().await.unwrap();
        assert_eq!(snapshot.files().len(), 1);
        assert_eq!(snapshot.detections().len(), 1);
        assert_eq!(fake.calls(Endpoint::Files), 1);
        assert_eq!(fake.calls(Endpoint::Jobs), 1);
        assert_eq!(fake.calls(Endpoint::Detections), 1);
        assert_eq!(engine.metrics().committed, 1);
    }

    #[tokio::test]
    async fn failed_detections_call_keeps_previous_snapshot() {
        let fake = Arc::new(FakeService::new());
        fake.seed_file("f1", "scene.png");
        let engine = engine_with(&fake);
        engine.refresh().await.unwrap();

        fake.seed_file("f2", "pulse.bin");
        fake.fail(Endpoint::Detections);
        let err = engine.refresh().await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));

        let snapshot = engine.registry().snapshot();
        assert_eq!(snapshot.files().len(), 1);
        assert!(snapshot.file("f2").is_none());
        assert_eq!(engine.last_error(), Some(err));
        assert_eq!(engine.metrics().failed, 1);

        fake.recover(Endpoint::Detections);
        engine.refresh().await.unwrap();
        assert!(engine.last_error().is_none());
        assert_eq!(engine.registry().snapshot().files().len(), 2);
    }

    #[tokio::test]
    async fn empty_analysis_request_never_reaches_the_network() {
        let fake = Arc::new(FakeService::new());
        let engine = engine_with(&fake);

        let err = engine
            .request_analysis(&[], AnalysisType::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn analysis_request_refreshes_out_of_band() {
        let fake = Arc::new(FakeService::new());
        fake.seed_file("f1", "scene.png");
        let engine = engine_with(&fake);

        let job = engine
            .request_analysis(&["f1".to_string()], AnalysisType::Single)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(fake.calls(Endpoint::Analyze), 1);
        assert_eq!(fake.calls(Endpoint::Jobs), 1);
        assert!(engine.registry().get(&job.id).is_some());
    }

    #[tokio::test]
    async fn failed_refresh_does_not_fail_analysis_request() {
        let fake = Arc::new(FakeService::new());
        fake.fail(Endpoint::Files);
        let engine = engine_with(&fake);

        let job = engine
            .request_analysis(&["f1".to_string()], AnalysisType::Batch)
            .await
            .unwrap();
        assert_eq!(job.analysis_type, AnalysisType::Batch);
        assert!(engine.last_error().is_some());
    }

    #[tokio::test]
    async fn rejected_analysis_request_surfaces_remote_reason() {
        let fake = Arc::new(FakeService::new());
        fake.fail(Endpoint::Analyze);
        let engine = engine_with(&fake);

        let err = engine
            .request_analysis(&["f1".to_string()], AnalysisType::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RemoteRejection { status: 500, .. }));
        assert_eq!(fake.calls(Endpoint::Files), 0);
    }

    #[tokio::test]
    async fn delete_file_refreshes_and_drops_the_file() {
        let fake = Arc::new(FakeService::new());
        fake.seed_file("f1", "scene.png");
        let engine = engine_with(&fake);
        engine.refresh().await.unwrap();

        engine.delete_file("f1").await.unwrap();
        assert!(engine.registry().file("f1").is_none());
        assert!(matches!(
            engine.delete_file(" ").await,
            Err(ClientError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn stop_discards_refresh_already_in_flight() {
        let fake = Arc::new(FakeService::new());
        fake.seed_file("f1", "scene.png");
        let gate = fake.gate_detections();
        let engine = engine_with(&fake);

        let in_flight = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.refresh().await })
        };
        while fake.calls(Endpoint::Detections) == 0 {
            tokio::task::yield_now().await;
        }

        engine.stop();
        gate.notify_one();

        let result = in_flight.await.unwrap();
        assert!(matches!(result, Err(ClientError::StaleCommit { .. })));
        assert!(engine.registry().snapshot().refreshed_at().is_none());
        assert_eq!(engine.metrics().stale, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_refreshes_immediately_then_on_interval() {
        let fake = Arc::new(FakeService::new());
        let engine = engine_with(&fake);

        let handle = engine.start(DEFAULT_POLL_INTERVAL);
        assert!(handle.is_active());
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(fake.calls(Endpoint::Files), 3);

        handle.cancel();
        assert!(!engine.is_running());
        tokio::time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(fake.calls(Endpoint::Files), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_still_polls() {
        let fake = Arc::new(FakeService::new());
        let engine = engine_with(&fake);

        let handle = engine.start(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(handle.is_active());
        assert!(fake.calls(Endpoint::Files) >= 2);
        assert!(engine.metrics().committed >= 2);
        handle.cancel();
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn later_commit_wins_over_earlier_issued_refresh() {
        let fake = Arc::new(FakeService::new());
        fake.seed_file("f1", "scene.png");
        let gate = fake.gate_detections();
        let engine = engine_with(&fake);

        let tick = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.refresh().await })
        };
        while fake.calls(Endpoint::Detections) == 0 {
            tokio::task::yield_now().await;
        }

        let job = engine
            .request_analysis(&["f1".to_string()], AnalysisType::Single)
            .await
            .unwrap();
        assert!(engine.registry().get(&job.id).is_some());

        gate.notify_one();
        let committed = tick.await.unwrap().unwrap();
        let current = engine.registry().snapshot();
        assert!(Arc::ptr_eq(&committed, &current));
        // The tick listed jobs before the analysis was created.
        assert!(engine.registry().get(&job.id).is_none());
        assert_eq!(current.files().len(), 1);
        assert_eq!(engine.metrics().committed, 2);
        assert_eq!(engine.metrics().stale, 0);
        assert!(engine.last_error().is_none());

        engine.refresh().await.unwrap();
        assert!(engine.registry().get(&job.id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_survives_failed_cycles() {
        let fake = Arc::new(FakeService::new());
        fake.fail(Endpoint::Jobs);
        let engine = engine_with(&fake);

        engine.start(Duration::from_millis(1_000));
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(engine.metrics().failed, 2);

        fake.recover(Endpoint::Jobs);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(engine.metrics().committed, 1);
        assert!(engine.is_running());
        engine.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_keeps_a_single_timer() {
        let fake = Arc::new(FakeService::new());
        let engine = engine_with(&fake);

        let first = engine.start(DEFAULT_POLL_INTERVAL);
        let second = engine.start(DEFAULT_POLL_INTERVAL);
        assert!(!first.is_active());
        assert!(second.is_active());

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(fake.calls(Endpoint::Files), 2);

        first.cancel();
        assert!(engine.is_running());
        second.cancel();
        assert!(!engine.is_running());
    }
}
