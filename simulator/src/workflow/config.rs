use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    pub port: u16,
    pub processing_delay_ms: u64,
    pub seed: u64,
    pub max_detections_per_file: usize,
    /// Jobs naming a file the store does not hold end as `failed`.
    pub fail_unknown_files: bool,
    pub max_upload_bytes: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            port: 8001,
            processing_delay_ms: 1_500,
            seed: 312,
            max_detections_per_file: 4,
            fail_unknown_files: true,
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}
