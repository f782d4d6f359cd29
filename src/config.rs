//! Engine configuration: defaults, builder overrides, and file loading.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, WatchError};

const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 4;
const DEFAULT_MIN_CONFIDENCE: f64 = 80.0;

/// Tunables for the scan pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-identifier evidence lookup timeout, in seconds.
    pub lookup_timeout_secs: u64,
    /// Upper bound on concurrent evidence lookups per scan.
    pub max_concurrent_lookups: usize,
    /// Confidence floor applied when a candidate carries a confidence score.
    pub min_confidence: f64,
    /// Strict mode: any accepted finding fails the CLI run, not just high or
    /// critical ones.
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            strict: false,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup_timeout_secs(mut self, secs: u64) -> Self {
        self.lookup_timeout_secs = secs;
        self
    }

    pub fn with_max_concurrent_lookups(mut self, max: usize) -> Self {
        self.max_concurrent_lookups = max;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load configuration from a YAML or JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WatchError::SnapshotRead {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config: EngineConfig = match ext.as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| WatchError::ConfigParse {
                    path: path.display().to_string(),
                    source: e,
                })?
            }
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(WatchError::Config(format!(
                    "unsupported config format: {ext}"
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from the first config file present in `root`, falling back to
    /// defaults.
    pub fn load(root: Option<&Path>) -> Self {
        if let Some(root) = root {
            for filename in &[".vaultwatch.yaml", ".vaultwatch.yml", ".vaultwatch.json"] {
                let path = root.join(filename);
                if path.exists() {
                    if let Ok(config) = Self::from_file(&path) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookup_timeout_secs == 0 {
            return Err(WatchError::Config(
                "lookup_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_lookups == 0 {
            return Err(WatchError::Config(
                "max_concurrent_lookups must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(WatchError::Config(
                "min_confidence must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}
