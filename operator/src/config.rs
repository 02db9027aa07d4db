use anyhow::Context;
use mstrcore::model::AnalysisType;
use mstrcore::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OperatorConfig {
    pub service: ClientConfig,
    pub analysis_type: AnalysisType,
}

impl OperatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading operator config {}", path_ref.display()))?;
        let config: OperatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing operator config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of the file values.
    pub fn with_overrides(mut self, base_url: Option<String>, interval_ms: Option<u64>) -> Self {
        if let Some(base_url) = base_url {
            self.service.base_url = base_url;
        }
        if let Some(interval_ms) = interval_ms {
            self.service.poll_interval_ms = interval_ms;
        }
        self
    }

    pub fn to_client_config(&self) -> ClientConfig {
        self.service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"service:\n  base_url: http://analysis.local:8001\n  poll_interval_ms: 2000\nanalysis_type: batch\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = OperatorConfig::load(&path).unwrap();
        assert_eq!(cfg.service.base_url, "http://analysis.local:8001");
        assert_eq!(cfg.service.poll_interval_ms, 2000);
        assert_eq!(cfg.service.request_timeout_ms, 30_000);
        assert_eq!(cfg.analysis_type, AnalysisType::Batch);
    }

    #[test]
    fn overrides_replace_file_values() {
        let cfg = OperatorConfig::default()
            .with_overrides(Some("http://10.0.0.5:8001".into()), None)
            .to_client_config();
        assert_eq!(cfg.base_url, "http://10.0.0.5:8001");
        assert_eq!(cfg.poll_interval_ms, 5_000);
    }
}
