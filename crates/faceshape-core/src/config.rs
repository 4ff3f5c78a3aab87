//! Classifier configuration file.
//!
//! A TOML document with every field optional:
//!
//! ```toml
//! policy = "refined_width"
//! history_size = 30
//!
//! [refined]
//! oblong_min_ratio = 1.5
//! square_tolerance = 0.05
//! oval_min_ratio = 1.2
//!
//! [legacy]
//! round_max_ratio = 1.1
//! ```

use crate::classifier::{ClassificationPolicy, Classifier, LegacyThresholds, RefinedThresholds};
use crate::stabilizer::{ShapeHistory, DEFAULT_HISTORY_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub policy: ClassificationPolicy,
    /// Frames covered by the majority vote.
    pub history_size: usize,
    pub legacy: LegacyThresholds,
    pub refined: RefinedThresholds,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            policy: ClassificationPolicy::default(),
            history_size: DEFAULT_HISTORY_SIZE,
            legacy: LegacyThresholds::default(),
            refined: RefinedThresholds::default(),
        }
    }
}

impl ShapeConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&src)?;
        tracing::debug!(path = %path.display(), policy = %config.policy, "loaded shape config");
        Ok(config)
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::with_thresholds(self.policy, self.legacy.clone(), self.refined.clone())
    }

    pub fn history(&self) -> ShapeHistory {
        ShapeHistory::new(self.history_size)
    }
}
