//! Perception core for assistive navigation.
//!
//! Fuses a monocular depth map with object detections to answer two
//! questions per camera frame: is something hazardously close, and where is
//! a requested target (for example a matched sign)?
//!
//! The pipeline per frame is:
//!
//! 1. decode the raw detector tensor into boxes ([`detection`]),
//! 2. rescale the boxes into depth-map space ([`geometry`]),
//! 3. calibrate relative depth into meters ([`depth`]),
//! 4. compare against the precomputed safe-distance surface and pick the
//!    nearest hazard and its sector ([`fusion`]).
//!
//! [`pipeline`] strings the steps together and hosts the inference
//! collaborator seam.

pub mod config;
pub mod depth;
pub mod detection;
pub mod error;
pub mod fusion;
pub mod geometry;
pub mod pipeline;

pub use config::NavConfig;
pub use depth::{
    AbsoluteDepthMap, CalibrationPoint, DepthCalibrator, DepthMap, RelativeDepthMap,
    SafeDistanceMap,
};
pub use detection::{Detection, DetectionDecoder, Letterbox, Rect};
pub use error::{CalibrationError, ConfigError, NavError};
pub use fusion::{Announcement, BoxDistance, HazardLocator, HazardResult, Sector};
pub use geometry::{BoundingBox, scale_boxes};
pub use pipeline::{
    Frame, FrameAnalyzer, FrameProcessor, FrameReport, LatestFrameSlot, NavigationPipeline,
    OverlayMode, TextMatch,
};
