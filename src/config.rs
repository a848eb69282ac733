use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Tunable knobs for the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Classification endpoint (multipart POST, field name `file`).
    pub endpoint: String,

    /// Period of the live-mode capture timer.
    pub capture_interval_ms: u64,

    /// Upper bound on a single classify call. Should stay below
    /// `capture_interval_ms` so a stalled call cannot occupy a full period.
    pub classify_timeout_ms: u64,

    /// How many outcomes the rolling history keeps.
    pub history_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/predict".to_string(),
            capture_interval_ms: 1500,
            classify_timeout_ms: 1200,
            history_capacity: 10,
        }
    }
}

impl ScanConfig {
    /// Load from a JSON file, falling back to defaults when the file does not
    /// exist. A file that exists but does not parse is an error, not a
    /// silent fallback.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture_interval_ms)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_millis(self.classify_timeout_ms)
    }
}
