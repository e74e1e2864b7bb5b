//! Depth maps, metric calibration and the safe-distance reference surface.

mod calibration;
#[cfg(feature = "visualize")]
pub mod colormap;
mod depth_map;
mod safe_map;

pub use calibration::{
    CalibrationConfig, CalibrationPoint, DepthCalibrator, SINGULAR_EPSILON, calibrate,
    calibrate_or_zero,
};
pub use depth_map::{AbsoluteDepthMap, DepthMap, Meters, Relative, RelativeDepthMap};
pub use safe_map::{SafeDistanceMap, SafeMapConfig};
