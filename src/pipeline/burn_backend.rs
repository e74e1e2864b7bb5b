//! Burn inference backend for depth estimation and detection.
//!
//! Wraps models built with the Burn framework as [`FrameProcessor`]s.
//!
//! # Example
//!
//! ```ignore
//! use navsight_rs::pipeline::{BurnDetector, BurnModel};
//! use burn::backend::NdArray;
//!
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> burn::tensor::Tensor<NdArray, 2> {
//!         // run the network and drop the batch dimension
//!     }
//! }
//!
//! let detector = BurnDetector::new(MyYoloModel::load("model.bin"), Default::default());
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use ndarray::Array2;
use thiserror::Error;

use super::{Frame, FrameProcessor};
use crate::depth::RelativeDepthMap;

#[derive(Error, Debug, Clone)]
pub enum BurnProcessorError {
    #[error("model output has {got} values, expected {expected}")]
    OutputSize { expected: usize, got: usize },

    #[error("failed to read model output: {0}")]
    Postprocessing(String),
}

/// A Burn network taking `[1, 3, H, W]` images in `[0, 1]`.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Forward pass; the output has its batch dimension removed.
    ///
    /// Depth models return `H x W`; detectors return `(4 + C) x N`.
    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Expected input size (width, height).
    fn input_size(&self) -> (u32, u32) {
        (640, 640)
    }
}

fn preprocess<B: Backend>(frame: &Frame, size: (u32, u32), device: &B::Device) -> Tensor<B, 4> {
    let (width, height) = size;
    let resized;
    let frame = if (frame.width(), frame.height()) == size {
        frame
    } else {
        resized = frame.resized(width, height);
        &resized
    };

    let data: Vec<f32> = frame.data().iter().map(|&x| x as f32 / 255.0).collect();

    // HWC bytes to NCHW
    Tensor::<B, 1>::from_floats(data.as_slice(), device)
        .reshape([1, height as usize, width as usize, 3])
        .permute([0, 3, 1, 2])
}

fn run_model<B: Backend, M: BurnModel<B>>(
    model: &M,
    device: &B::Device,
    frame: &Frame,
) -> Result<((usize, usize), Vec<f32>), BurnProcessorError> {
    let input = preprocess::<B>(frame, model.input_size(), device);
    let output = model.forward(input);
    let [rows, cols] = output.dims();
    let values = output
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| BurnProcessorError::Postprocessing(format!("{e:?}")))?;
    if values.len() != rows * cols {
        return Err(BurnProcessorError::OutputSize {
            expected: rows * cols,
            got: values.len(),
        });
    }
    Ok(((rows, cols), values))
}

/// Relative depth from a Burn depth network.
pub struct BurnDepthEstimator<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
}

impl<B: Backend, M: BurnModel<B>> BurnDepthEstimator<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device }
    }
}

impl<B: Backend, M: BurnModel<B>> FrameProcessor for BurnDepthEstimator<B, M> {
    type Output = RelativeDepthMap;
    type Error = BurnProcessorError;

    fn process(&mut self, frame: &Frame) -> Result<RelativeDepthMap, Self::Error> {
        let ((height, width), values) = run_model(&self.model, &self.device, frame)?;
        RelativeDepthMap::from_vec(height, width, values)
            .map_err(|e| BurnProcessorError::Postprocessing(e.to_string()))
    }
}

/// Raw `(4 + C) x N` detector tensor from a Burn network.
pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device }
    }
}

impl<B: Backend, M: BurnModel<B>> FrameProcessor for BurnDetector<B, M> {
    type Output = Array2<f32>;
    type Error = BurnProcessorError;

    fn process(&mut self, frame: &Frame) -> Result<Array2<f32>, Self::Error> {
        let (shape, values) = run_model(&self.model, &self.device, frame)?;
        Array2::from_shape_vec(shape, values)
            .map_err(|e| BurnProcessorError::Postprocessing(e.to_string()))
    }
}
