//! Error types.
//!
//! Configuration mistakes surface as [`ConfigError`] when a stage is
//! constructed. Per-frame problems are either [`CalibrationError`] or
//! [`NavError`]; the frame path turns them into neutral results instead of
//! propagating them.

use thiserror::Error;

/// Setup mistakes detected while building a pipeline stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Fewer than two calibration points configured.
    #[error("at least 2 calibration points are required, got {0}")]
    TooFewCalibrationPoints(usize),

    /// A calibration point with a reference depth of zero or below.
    #[error("calibration point ({x}, {y}) has non-positive depth {depth}")]
    NonPositiveCalibrationDepth { x: usize, y: usize, depth: f64 },

    /// A zero map or recognizer resolution.
    #[error("resolution must be positive, got {0}")]
    InvalidResolution(usize),

    /// A safe-map sampling step of zero.
    #[error("grid step must be at least 1")]
    InvalidGridStep,

    /// A threshold or ratio outside its allowed range.
    #[error("{name} must be within {range}, got {value}")]
    InvalidThreshold {
        name: &'static str,
        range: &'static str,
        value: f64,
    },

    /// Corridor walls that do not bound a positive width.
    #[error("left wall ({left}) must lie left of right wall ({right})")]
    InvalidWallGeometry { left: f64, right: f64 },

    /// A camera mounted at or below the floor.
    #[error("camera height must be positive, got {0}")]
    InvalidCameraHeight(f64),

    /// The configuration file is not valid TOML for [`NavConfig`](crate::NavConfig).
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),
}

/// Why a relative depth map could not be converted into meters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// Empty map, or no positive relative depth to normalize by.
    #[error("depth map is empty or its maximum is not positive")]
    InvalidDepthInput,

    /// Fewer than two points reached the solver.
    #[error("at least 2 calibration points are required, got {0}")]
    InsufficientCalibrationPoints(usize),

    /// All calibration samples share one relative depth, so no line fits.
    #[error("calibration system is near-singular")]
    SingularCalibration,

    /// A calibration point beyond the map edges.
    #[error("calibration point ({x}, {y}) lies outside the {width}x{height} map")]
    PointOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// Top-level error for the perception pipeline.
#[derive(Error, Debug)]
pub enum NavError {
    /// Model output or depth buffer whose shape disagrees with what was expected.
    #[error("malformed detector tensor: expected shape {expected:?}, got {got:?}")]
    MalformedTensor {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// Pixel buffer length that does not match `width * height * 3`.
    #[error("invalid frame: expected {expected} bytes, got {got}")]
    InvalidFrame { expected: usize, got: usize },

    /// Relative depth could not be converted into meters.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// A stage was built from an invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The pipeline was used after [`release`](crate::NavigationPipeline::release).
    #[error("pipeline has been released")]
    Released,

    /// A depth, detection or recognition model failed on a frame.
    #[error("{stage} inference failed: {message}")]
    Inference {
        stage: &'static str,
        message: String,
    },
}
