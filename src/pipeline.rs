//! Per-frame orchestration around the perception core.
//!
//! This module provides the seam to inference collaborators
//! ([`FrameProcessor`]), the per-frame sequence ([`FrameAnalyzer`]) and the
//! frame-dropping hand-off between a camera thread and the worker
//! ([`LatestFrameSlot`]).

mod analyzer;
mod buffer_pool;
mod frame;
mod latest;
mod navigation;
mod processor;

pub use analyzer::{FrameAnalyzer, FrameReport, OverlayBox, OverlayMode, TargetReport, TextMatch};
pub use buffer_pool::{BufferPool, DEFAULT_POOL_CAPACITY};
pub use frame::Frame;
pub use latest::LatestFrameSlot;
pub use navigation::{NavigationPipeline, NoTextMatcher};
pub use processor::FrameProcessor;

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnDepthEstimator, BurnDetector, BurnModel, BurnProcessorError};
