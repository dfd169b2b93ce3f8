//! Parser configuration.

use rigscene_annotate::CameraSelector;
use rigscene_data::{CameraGroups, parse_flag};
use rigscene_ingest::AssemblerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Everything a conversion run can be tuned with. Every field has a default,
/// so an empty JSON object is a valid config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub cameras: CameraGroups,
    pub projection: CameraSelector,
    pub assembler: AssemblerConfig,
    pub logging: LoggingConfig,
    /// Attribute dictionary (flat map or label-schema recipe).
    pub attributes: Option<PathBuf>,
}

impl ParserConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }

    /// Apply deployment-style `"true"`/`"True"` overrides to the camera groups.
    pub fn with_group_flags(
        mut self,
        ir: Option<&str>,
        rgb: Option<&str>,
        rgb_highres: Option<&str>,
    ) -> Self {
        if let Some(flag) = ir {
            self.cameras.ir = parse_flag(flag);
        }
        if let Some(flag) = rgb {
            self.cameras.rgb = parse_flag(flag);
        }
        if let Some(flag) = rgb_highres {
            self.cameras.rgb_highres = parse_flag(flag);
        }
        self
    }
}
