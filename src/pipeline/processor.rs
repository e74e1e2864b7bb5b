//! Seam to the inference collaborators.

use super::Frame;

/// A model-backed stage that turns a camera frame into a tensor-shaped
/// result.
///
/// Depth estimation, object detection and text recognition each implement
/// this trait; the pipeline never looks inside the model.
///
/// # Example
///
/// ```ignore
/// use navsight_rs::{Frame, FrameProcessor, RelativeDepthMap};
///
/// struct MyDepthModel {
///     // runtime session here
/// }
///
/// impl FrameProcessor for MyDepthModel {
///     type Output = RelativeDepthMap;
///     type Error = std::io::Error;
///
///     fn process(&mut self, frame: &Frame) -> Result<RelativeDepthMap, Self::Error> {
///         // run inference
///         Ok(RelativeDepthMap::zeros(320, 320))
///     }
/// }
/// ```
pub trait FrameProcessor {
    type Output;
    type Error: std::fmt::Display;

    /// Run inference on one frame.
    fn process(&mut self, frame: &Frame) -> Result<Self::Output, Self::Error>;

    /// Free model resources. Called once when the owning pipeline shuts
    /// down; `process` is not called afterwards.
    fn release(&mut self) {}
}

impl<P: FrameProcessor + ?Sized> FrameProcessor for Box<P> {
    type Output = P::Output;
    type Error = P::Error;

    fn process(&mut self, frame: &Frame) -> Result<Self::Output, Self::Error> {
        (**self).process(frame)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
