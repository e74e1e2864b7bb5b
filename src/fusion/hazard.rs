use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::locator::grid_samples;
use super::{BoxDistance, Sector, nearest_distance};
use crate::depth::{AbsoluteDepthMap, SafeDistanceMap};
use crate::error::ConfigError;
use crate::geometry::BoundingBox;

/// Sampling and cutoff settings for fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Sampling stride inside each box, in depth-map pixels.
    pub grid_step: usize,
    /// Hazards farther than this are ignored for the whole frame.
    pub hazard_cutoff_m: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            grid_step: 3,
            hazard_cutoff_m: 3.0,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_step == 0 {
            return Err(ConfigError::InvalidGridStep);
        }
        if !self.hazard_cutoff_m.is_finite() || self.hazard_cutoff_m <= 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "hazard_cutoff_m",
                range: "(0, inf)",
                value: self.hazard_cutoff_m as f64,
            });
        }
        Ok(())
    }
}

/// The nearest box that intrudes into the safe corridor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardResult {
    /// Index into the boxes passed to the check.
    pub box_index: usize,
    pub distance_m: f32,
    pub sector: Sector,
}

/// Find the nearest box with a pixel closer than the safe-distance surface.
///
/// A pixel qualifies only when its depth is strictly below the safe map at
/// the same position. The box with the closest qualifying pixel wins; if
/// that distance is beyond `cutoff_m` the frame is reported hazard-free.
pub fn check_hazard(
    depth: &AbsoluteDepthMap,
    safe_map: &SafeDistanceMap,
    boxes: &[BoundingBox],
    grid_step: usize,
    cutoff_m: f32,
) -> Option<HazardResult> {
    let resolution = safe_map.resolution();
    if depth.width() != resolution || depth.height() != resolution {
        warn!(
            depth_width = depth.width(),
            depth_height = depth.height(),
            resolution,
            "depth map does not match safe-distance map"
        );
        return None;
    }

    let depth_view = depth.view();
    let safe_view = safe_map.view();
    let mut nearest: Option<(usize, f32)> = None;

    for (index, bbox) in boxes.iter().enumerate() {
        let closest = grid_samples(*bbox, grid_step, resolution, resolution)
            .filter_map(|(x, y)| {
                let d = depth_view[[y, x]];
                (d < safe_view[[y, x]]).then_some(d)
            })
            .reduce(f32::min);

        if let Some(d) = closest {
            if nearest.is_none_or(|(_, best)| d < best) {
                nearest = Some((index, d));
            }
        }
    }

    let (box_index, distance_m) = nearest?;
    if distance_m > cutoff_m {
        debug!(distance_m, cutoff_m, "nearest intrusion beyond cutoff");
        return None;
    }
    let bbox = boxes[box_index];
    Some(HazardResult {
        box_index,
        distance_m,
        sector: Sector::from_center(bbox.center_x(), resolution),
    })
}

/// Fusion stage holding the shared safe-distance map.
#[derive(Debug, Clone)]
pub struct HazardLocator {
    safe_map: Arc<SafeDistanceMap>,
    config: FusionConfig,
}

impl HazardLocator {
    pub fn new(safe_map: Arc<SafeDistanceMap>, config: FusionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            resolution = safe_map.resolution(),
            grid_step = config.grid_step,
            cutoff_m = config.hazard_cutoff_m,
            "hazard locator ready"
        );
        Ok(Self { safe_map, config })
    }

    pub fn safe_map(&self) -> &SafeDistanceMap {
        &self.safe_map
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Nearest hazard among `boxes` (depth-map space), if any.
    pub fn check(&self, depth: &AbsoluteDepthMap, boxes: &[BoundingBox]) -> Option<HazardResult> {
        check_hazard(
            depth,
            &self.safe_map,
            boxes,
            self.config.grid_step,
            self.config.hazard_cutoff_m,
        )
    }

    /// Distance and direction of an externally chosen target box.
    pub fn locate_target(&self, depth: &AbsoluteDepthMap, target: BoundingBox) -> Option<BoxDistance> {
        nearest_distance(depth, target, self.config.grid_step)
    }
}
