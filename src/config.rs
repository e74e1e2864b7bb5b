//! Startup configuration.
//!
//! Every stage has its own config struct next to the stage; [`NavConfig`]
//! gathers them so a deployment can be described in one TOML file:
//!
//! ```toml
//! depth_resolution = 320
//! ocr_resolution = 640
//!
//! [detector]
//! num_classes = 13
//! iou_threshold = 0.2
//!
//! [fusion]
//! hazard_cutoff_m = 3.0
//!
//! [[calibration.points]]
//! x = 128
//! y = 0
//! depth_m = 7.0
//!
//! [[calibration.points]]
//! x = 128
//! y = 255
//! depth_m = 1.75
//! ```
//!
//! Missing keys fall back to the reference deployment values.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::depth::{CalibrationConfig, SafeMapConfig};
use crate::detection::DecoderConfig;
use crate::error::ConfigError;
use crate::fusion::FusionConfig;

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Side of the square depth map (and safe-distance map).
    pub depth_resolution: usize,
    /// Side of the square frame handed to the text recognizer.
    pub ocr_resolution: usize,
    pub detector: DecoderConfig,
    pub calibration: CalibrationConfig,
    pub safe_map: SafeMapConfig,
    pub fusion: FusionConfig,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            depth_resolution: 320,
            ocr_resolution: 640,
            detector: DecoderConfig::default(),
            calibration: CalibrationConfig::default(),
            safe_map: SafeMapConfig::default(),
            fusion: FusionConfig::default(),
        }
    }
}

impl NavConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&source)?;
        info!(path = %path.display(), "loaded navigation config");
        Ok(config)
    }

    /// Check every stage for setup mistakes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth_resolution == 0 {
            return Err(ConfigError::InvalidResolution(self.depth_resolution));
        }
        if self.ocr_resolution == 0 {
            return Err(ConfigError::InvalidResolution(self.ocr_resolution));
        }
        self.detector.validate()?;
        self.calibration.validate()?;
        self.safe_map.validate()?;
        self.fusion.validate()?;
        Ok(())
    }
}
