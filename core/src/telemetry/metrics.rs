use std::sync::Mutex;

/// Counters for refresh cycles run by the polling engine.
pub struct MetricsRecorder {
    inner: Mutex<CycleMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleMetrics {
    pub committed: usize,
    pub failed: usize,
    pub stale: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CycleMetrics::default()),
        }
    }

    pub fn record_committed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.committed += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed += 1;
        }
    }

    pub fn record_stale(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.stale += 1;
        }
    }

    pub fn snapshot(&self) -> CycleMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            CycleMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_each_outcome() {
        let recorder = MetricsRecorder::new();
        recorder.record_committed();
        recorder.record_committed();
        recorder.record_failed();
        recorder.record_stale();
        assert_eq!(
            recorder.snapshot(),
            CycleMetrics {
                committed: 2,
                failed: 1,
                stale: 1,
            }
        );
    }
}
