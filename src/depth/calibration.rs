//! Least-squares conversion of relative depth into meters.
//!
//! Inverse depth is modelled as an affine function of the normalized relative
//! value `r`: `1 / d = s * r + t * (1 - r)`. The two unknowns are fitted to
//! the calibration points through the 2x2 normal equations.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::depth_map::{AbsoluteDepthMap, RelativeDepthMap};
use crate::error::{CalibrationError, ConfigError};

/// Determinant magnitude below which the normal equations count as singular.
pub const SINGULAR_EPSILON: f64 = 1e-6;

/// Pixel with a known real distance, in depth-map space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub x: usize,
    pub y: usize,
    /// Real distance in meters; must be positive.
    pub depth_m: f64,
}

impl CalibrationPoint {
    pub fn new(x: usize, y: usize, depth_m: f64) -> Self {
        Self { x, y, depth_m }
    }
}

/// Calibration references supplied at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub points: Vec<CalibrationPoint>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            points: vec![
                CalibrationPoint::new(128, 0, 7.0),
                CalibrationPoint::new(128, 255, 1.75),
            ],
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points.len() < 2 {
            return Err(ConfigError::TooFewCalibrationPoints(self.points.len()));
        }
        for p in &self.points {
            if p.depth_m.is_nan() || p.depth_m <= 0.0 {
                return Err(ConfigError::NonPositiveCalibrationDepth {
                    x: p.x,
                    y: p.y,
                    depth: p.depth_m,
                });
            }
        }
        Ok(())
    }
}

/// Convert a relative depth map into meters using the calibration points.
pub fn calibrate(
    relative: &RelativeDepthMap,
    points: &[CalibrationPoint],
) -> Result<AbsoluteDepthMap, CalibrationError> {
    let max = match relative.max_value() {
        Some(max) if max > 0.0 => max,
        _ => return Err(CalibrationError::InvalidDepthInput),
    };
    if points.len() < 2 {
        return Err(CalibrationError::InsufficientCalibrationPoints(points.len()));
    }

    let normalized = relative.view().mapv(|v| v / max);

    let mut ata = Matrix2::<f64>::zeros();
    let mut aty = Vector2::<f64>::zeros();
    for p in points {
        let rel = normalized
            .get((p.y, p.x))
            .copied()
            .ok_or(CalibrationError::PointOutOfBounds {
                x: p.x,
                y: p.y,
                width: relative.width(),
                height: relative.height(),
            })? as f64;
        let row = Vector2::new(rel, 1.0 - rel);
        ata += row * row.transpose();
        aty += row * (1.0 / p.depth_m);
    }

    let det = ata.determinant();
    if det.abs() < SINGULAR_EPSILON {
        return Err(CalibrationError::SingularCalibration);
    }
    let inverse = ata
        .try_inverse()
        .ok_or(CalibrationError::SingularCalibration)?;
    let solution = inverse * aty;
    let (s, t) = (solution[0], solution[1]);

    let min_depth = 1.0 / s;
    let max_depth = 1.0 / t;
    let a = 1.0 / min_depth - 1.0 / max_depth;
    let b = 1.0 / max_depth;
    debug!(min_depth, max_depth, det, "fitted depth calibration");

    let absolute = normalized.mapv(|rel| (1.0 / (a * rel as f64 + b)) as f32);
    Ok(AbsoluteDepthMap::from_array(absolute))
}

/// Like [`calibrate`], but degenerate input yields a zero-filled map.
///
/// Depth is best-effort: one bad frame must not stop the loop.
pub fn calibrate_or_zero(
    relative: &RelativeDepthMap,
    points: &[CalibrationPoint],
) -> AbsoluteDepthMap {
    match calibrate(relative, points) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "depth calibration failed, using zero map");
            AbsoluteDepthMap::zeros(relative.height(), relative.width())
        }
    }
}

/// Calibration constants validated once at startup.
#[derive(Debug, Clone)]
pub struct DepthCalibrator {
    points: Vec<CalibrationPoint>,
}

impl DepthCalibrator {
    pub fn new(points: Vec<CalibrationPoint>) -> Result<Self, ConfigError> {
        let config = CalibrationConfig { points };
        config.validate()?;
        info!(points = config.points.len(), "depth calibrator ready");
        Ok(Self {
            points: config.points,
        })
    }

    pub fn from_config(config: &CalibrationConfig) -> Result<Self, ConfigError> {
        Self::new(config.points.clone())
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Calibrate one frame, reporting why it failed.
    pub fn try_apply(&self, relative: &RelativeDepthMap) -> Result<AbsoluteDepthMap, CalibrationError> {
        calibrate(relative, &self.points)
    }

    /// Calibrate one frame; failures produce a zero map.
    pub fn apply(&self, relative: &RelativeDepthMap) -> AbsoluteDepthMap {
        calibrate_or_zero(relative, &self.points)
    }
}
