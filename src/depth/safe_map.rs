//! Reference surface of hazard-free distances.
//!
//! The scene model is a corridor: a floor plane below the camera and two
//! vertical side walls, seen through a simplified perspective with a single
//! vanishing row. For each pixel the map stores how far away that corridor
//! surface would be. A real depth reading closer than this value means
//! something is intruding into otherwise open space.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Fixed camera-mount and corridor constants, in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeMapConfig {
    /// Camera height above the floor.
    pub camera_height: f64,
    /// Nearest floor distance visible at the bottom image row.
    pub start_z: f64,
    /// World x of the left wall (negative).
    pub left_wall: f64,
    /// World x of the right wall.
    pub right_wall: f64,
    pub wall_height: f64,
    /// Vanishing row as a fraction of the resolution.
    pub vanishing_ratio: f64,
}

impl Default for SafeMapConfig {
    fn default() -> Self {
        Self {
            camera_height: 1.3,
            start_z: 1.75,
            left_wall: -0.6,
            right_wall: 0.6,
            wall_height: 1.7,
            vanishing_ratio: 0.3,
        }
    }
}

impl SafeMapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera_height.is_nan() || self.camera_height <= 0.0 {
            return Err(ConfigError::InvalidCameraHeight(self.camera_height));
        }
        if self.left_wall.is_nan() || self.right_wall.is_nan() || self.left_wall >= self.right_wall {
            return Err(ConfigError::InvalidWallGeometry {
                left: self.left_wall,
                right: self.right_wall,
            });
        }
        if self.wall_height.is_nan() || self.wall_height <= 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "wall_height",
                range: "(0, inf)",
                value: self.wall_height,
            });
        }
        if !(0.0..1.0).contains(&self.vanishing_ratio) {
            return Err(ConfigError::InvalidThreshold {
                name: "vanishing_ratio",
                range: "[0, 1)",
                value: self.vanishing_ratio,
            });
        }
        Ok(())
    }
}

/// Derived projection constants for one resolution.
struct Corridor<'a> {
    config: &'a SafeMapConfig,
    center_x: f64,
    vanishing_y: f64,
    /// Rows between the vanishing row and the virtual bottom row.
    span: f64,
    /// Horizontal pixels per world meter at the bottom row.
    scale_x: f64,
}

/// A 3D point on the corridor surface, camera at the origin of x and z.
type WorldPoint = (f64, f64, f64);

const DEGENERATE: f64 = 1e-9;

impl<'a> Corridor<'a> {
    fn new(resolution: usize, config: &'a SafeMapConfig) -> Self {
        let n = resolution as i64;
        let vanishing_y = (resolution as f64 * config.vanishing_ratio) as i64;
        let bottom_y = n + vanishing_y;
        let span = (bottom_y - vanishing_y) as f64;
        Self {
            config,
            center_x: (n / 2) as f64,
            vanishing_y: vanishing_y as f64,
            span,
            scale_x: span / (config.right_wall - config.left_wall),
        }
    }

    fn floor(&self, u: f64, v: f64) -> Option<WorldPoint> {
        let h = self.config.camera_height;
        let factor = (v - self.vanishing_y) / self.span;
        if factor <= 0.0 {
            return None;
        }
        let z = self.config.start_z + h / factor - h;
        let x = (u - self.center_x) / (self.scale_x * factor);
        Some((x, 0.0, z))
    }

    fn wall(&self, u: f64, v: f64, wall_x: f64) -> Option<WorldPoint> {
        let h = self.config.camera_height;
        let denom = wall_x * self.scale_x;
        if denom.abs() < DEGENERATE {
            return None;
        }
        let factor = (u - self.center_x) / denom;
        if factor <= 0.0 {
            return None;
        }
        let z = self.config.start_z + h / factor - h;
        let row_denom = self.span * factor;
        if row_denom.abs() < DEGENERATE {
            return None;
        }
        let y = h - h * ((v - self.vanishing_y) / row_denom);
        Some((wall_x, y, z))
    }

    /// Nearest valid corridor surface at pixel `(u, v)`, or infinity.
    fn distance(&self, u: usize, v: usize) -> f64 {
        let c = self.config;
        let (u, v) = (u as f64, v as f64);
        let mut best = f64::INFINITY;

        if let Some((x, _, z)) = self.floor(u, v) {
            if (c.left_wall..=c.right_wall).contains(&x) && z >= c.start_z {
                // Floor hits use the planar x/z distance with no camera-height
                // term, matching the reference corridor builder. Wall hits
                // below keep the full 3D distance.
                best = best.min((x * x + z * z).sqrt());
            }
        }
        for wall_x in [c.left_wall, c.right_wall] {
            if let Some((x, y, z)) = self.wall(u, v, wall_x) {
                if (0.0..=c.wall_height).contains(&y) && z >= c.start_z {
                    let dy = y - c.camera_height;
                    best = best.min((x * x + dy * dy + z * z).sqrt());
                }
            }
        }
        best
    }
}

/// Square grid of hazard-free distances in meters.
///
/// Built once at startup and shared read-only across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeDistanceMap {
    values: Array2<f32>,
}

impl SafeDistanceMap {
    /// Build the map for a square `resolution x resolution` depth space.
    pub fn build(resolution: usize, config: &SafeMapConfig) -> Result<Self, ConfigError> {
        if resolution == 0 {
            return Err(ConfigError::InvalidResolution(resolution));
        }
        config.validate()?;

        let corridor = Corridor::new(resolution, config);
        let values = Array2::from_shape_fn((resolution, resolution), |(v, u)| {
            corridor.distance(u, v) as f32
        });
        let finite = values.iter().filter(|d| d.is_finite()).count();
        info!(resolution, finite, "built safe-distance map");
        Ok(Self { values })
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.values.nrows()
    }

    /// Distance at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.values.get((y, x)).copied()
    }

    pub fn view(&self) -> ndarray::ArrayView2<'_, f32> {
        self.values.view()
    }
}
