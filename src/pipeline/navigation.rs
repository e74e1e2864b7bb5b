//! NavigationPipeline for combining inference with hazard analysis.

use std::convert::Infallible;

use ndarray::Array2;
use tracing::{debug, info, warn};

use super::{BufferPool, Frame, FrameAnalyzer, FrameProcessor, FrameReport, LatestFrameSlot, TextMatch};
use crate::depth::RelativeDepthMap;
use crate::error::NavError;

/// Text stage for deployments without a recognizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextMatcher;

impl FrameProcessor for NoTextMatcher {
    type Output = Option<TextMatch>;
    type Error = Infallible;

    fn process(&mut self, _frame: &Frame) -> Result<Option<TextMatch>, Infallible> {
        Ok(None)
    }
}

fn inference_error(stage: &'static str, error: impl std::fmt::Display) -> NavError {
    NavError::Inference {
        stage,
        message: error.to_string(),
    }
}

/// Bundles the depth, detection and text processors with a
/// [`FrameAnalyzer`].
///
/// Each call to [`process_frame`](Self::process_frame) runs depth
/// estimation on the camera frame, detection on a copy resized to the
/// detector input, and, only when no hazard is present, text matching on a
/// copy at text-recognizer resolution. Resized copies come from a bounded
/// [`BufferPool`].
///
/// Processors are released exactly once, either by
/// [`release`](Self::release) or on drop.
pub struct NavigationPipeline<D, Y, T = NoTextMatcher>
where
    D: FrameProcessor<Output = RelativeDepthMap>,
    Y: FrameProcessor<Output = Array2<f32>>,
    T: FrameProcessor<Output = Option<TextMatch>>,
{
    depth: D,
    detector: Y,
    text: T,
    analyzer: FrameAnalyzer,
    pool: BufferPool,
    frames: u64,
    released: bool,
}

impl<D, Y> NavigationPipeline<D, Y, NoTextMatcher>
where
    D: FrameProcessor<Output = RelativeDepthMap>,
    Y: FrameProcessor<Output = Array2<f32>>,
{
    /// Create a pipeline without a text stage.
    pub fn new(depth: D, detector: Y, analyzer: FrameAnalyzer) -> Self {
        Self::with_text_matcher(depth, detector, NoTextMatcher, analyzer)
    }
}

impl<D, Y, T> NavigationPipeline<D, Y, T>
where
    D: FrameProcessor<Output = RelativeDepthMap>,
    Y: FrameProcessor<Output = Array2<f32>>,
    T: FrameProcessor<Output = Option<TextMatch>>,
{
    pub fn with_text_matcher(depth: D, detector: Y, text: T, analyzer: FrameAnalyzer) -> Self {
        Self {
            depth,
            detector,
            text,
            analyzer,
            pool: BufferPool::default(),
            frames: 0,
            released: false,
        }
    }

    /// Process a single frame.
    ///
    /// Depth or detector failures abort the frame with
    /// [`NavError::Inference`]; a failing text stage only costs the target.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport, NavError> {
        if self.released {
            return Err(NavError::Released);
        }
        self.frames += 1;

        let relative = self
            .depth
            .process(frame)
            .map_err(|e| inference_error("depth", e))?;

        let size = self.analyzer.detector_input_size();
        let detector_frame = frame.resize_with(size, size, &mut self.pool);
        let raw = self.detector.process(&detector_frame);
        detector_frame.recycle(&mut self.pool);
        let raw = raw.map_err(|e| inference_error("detection", e))?;

        let mut report = self.analyzer.begin(&relative, raw.view());
        if report.calibrated && !self.analyzer.apply_hazard(&mut report) {
            let size = self.analyzer.ocr_resolution() as u32;
            let text_frame = frame.resize_with(size, size, &mut self.pool);
            let matched = self.text.process(&text_frame);
            text_frame.recycle(&mut self.pool);
            match matched {
                Ok(Some(text)) => self.analyzer.apply_target(&mut report, &text),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "text stage failed"),
            }
        }

        debug!(
            frame = self.frames,
            boxes = report.boxes.len(),
            hazard = report.has_hazard(),
            target = report.target.is_some(),
            "frame processed"
        );
        Ok(report)
    }

    /// Drain `slot` until it is closed, handing each report to `on_report`.
    ///
    /// Failed frames are logged and skipped. Returns the number of frames
    /// that produced a report.
    pub fn run(&mut self, slot: &LatestFrameSlot<Frame>, mut on_report: impl FnMut(FrameReport)) -> u64 {
        let mut reported = 0;
        while let Some(frame) = slot.take() {
            match self.process_frame(&frame) {
                Ok(report) => {
                    reported += 1;
                    on_report(report);
                }
                Err(NavError::Released) => break,
                Err(e) => warn!(error = %e, "skipping frame"),
            }
        }
        info!(reported, dropped = slot.dropped(), "frame loop finished");
        reported
    }

    /// Release every processor. Later calls do nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.depth.release();
        self.detector.release();
        self.text.release();
        info!(frames = self.frames, "navigation pipeline released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Frames handed to [`process_frame`](Self::process_frame) so far.
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn analyzer(&self) -> &FrameAnalyzer {
        &self.analyzer
    }

    pub fn depth_processor(&self) -> &D {
        &self.depth
    }

    pub fn detector(&self) -> &Y {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut Y {
        &mut self.detector
    }

    pub fn text_matcher(&self) -> &T {
        &self.text
    }
}

impl<D, Y, T> Drop for NavigationPipeline<D, Y, T>
where
    D: FrameProcessor<Output = RelativeDepthMap>,
    Y: FrameProcessor<Output = Array2<f32>>,
    T: FrameProcessor<Output = Option<TextMatch>>,
{
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::depth::{CalibrationConfig, CalibrationPoint};
    use crate::detection::DecoderConfig;
    use crate::fusion::Subject;
    use crate::geometry::BoundingBox;
    use std::cell::Cell;
    use std::rc::Rc;

    const RES: usize = 32;
    const INPUT: u32 = 64;

    fn analyzer() -> FrameAnalyzer {
        FrameAnalyzer::new(&NavConfig {
            depth_resolution: RES,
            ocr_resolution: 48,
            detector: DecoderConfig {
                input_size: INPUT,
                num_classes: 2,
                num_cells: 4,
                ..DecoderConfig::default()
            },
            calibration: CalibrationConfig {
                points: vec![
                    CalibrationPoint::new(16, 0, 7.0),
                    CalibrationPoint::new(16, 31, 1.0),
                ],
            },
            ..NavConfig::default()
        })
        .unwrap()
    }

    struct MockDepth {
        map: RelativeDepthMap,
        released: Rc<Cell<u32>>,
    }

    impl FrameProcessor for MockDepth {
        type Output = RelativeDepthMap;
        type Error = Infallible;

        fn process(&mut self, _frame: &Frame) -> Result<RelativeDepthMap, Infallible> {
            Ok(self.map.clone())
        }

        fn release(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    struct MockDetector {
        tensor: Array2<f32>,
        seen_sizes: Vec<(u32, u32)>,
        fail: bool,
    }

    impl FrameProcessor for MockDetector {
        type Output = Array2<f32>;
        type Error = String;

        fn process(&mut self, frame: &Frame) -> Result<Array2<f32>, String> {
            self.seen_sizes.push((frame.width(), frame.height()));
            if self.fail {
                return Err("session lost".into());
            }
            Ok(self.tensor.clone())
        }
    }

    struct MockText {
        result: Option<TextMatch>,
        calls: Rc<Cell<u32>>,
    }

    impl FrameProcessor for MockText {
        type Output = Option<TextMatch>;
        type Error = Infallible;

        fn process(&mut self, frame: &Frame) -> Result<Option<TextMatch>, Infallible> {
            assert_eq!(frame.width(), 48);
            self.calls.set(self.calls.get() + 1);
            Ok(self.result.clone())
        }
    }

    /// Far on the top row (7 m), near everywhere else (1 m).
    fn depth(released: &Rc<Cell<u32>>) -> MockDepth {
        MockDepth {
            map: RelativeDepthMap::from_array(Array2::from_shape_fn((RES, RES), |(y, _)| {
                if y == 0 { 1.0 } else { 7.0 }
            })),
            released: Rc::clone(released),
        }
    }

    fn detector(boxes: &[(f32, f32, f32, f32)]) -> MockDetector {
        let mut tensor = Array2::zeros((6, 4));
        for (cell, &(cx, cy, w, h)) in boxes.iter().enumerate() {
            tensor[[0, cell]] = cx;
            tensor[[1, cell]] = cy;
            tensor[[2, cell]] = w;
            tensor[[3, cell]] = h;
            tensor[[4, cell]] = 0.9;
        }
        MockDetector {
            tensor,
            seen_sizes: Vec::new(),
            fail: false,
        }
    }

    #[test]
    fn test_detector_sees_input_size() {
        let released = Rc::new(Cell::new(0));
        let mut pipeline = NavigationPipeline::new(depth(&released), detector(&[]), analyzer());
        let frame = Frame::filled(100, 80, [0, 0, 0]);
        let report = pipeline.process_frame(&frame).unwrap();
        assert!(report.calibrated);
        assert!(report.hazard.is_none());
        assert_eq!(pipeline.detector().seen_sizes, vec![(INPUT, INPUT)]);
    }

    #[test]
    fn test_hazard_skips_text_stage() {
        let released = Rc::new(Cell::new(0));
        let calls = Rc::new(Cell::new(0));
        let text = MockText {
            result: Some(TextMatch::new(vec![BoundingBox::new(0, 0, 10, 10)], 0, "exit")),
            calls: Rc::clone(&calls),
        };
        let mut pipeline = NavigationPipeline::with_text_matcher(
            depth(&released),
            detector(&[(32.0, 56.0, 16.0, 16.0)]),
            text,
            analyzer(),
        );

        let report = pipeline.process_frame(&Frame::filled(64, 64, [0, 0, 0])).unwrap();
        assert!(report.has_hazard());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_text_target_when_clear() {
        let released = Rc::new(Cell::new(0));
        let calls = Rc::new(Cell::new(0));
        // 48 px text space to 32 px depth space
        let text = MockText {
            result: Some(TextMatch::new(vec![BoundingBox::new(0, 3, 12, 9)], 0, "bakery")),
            calls: Rc::clone(&calls),
        };
        let mut pipeline = NavigationPipeline::with_text_matcher(
            depth(&released),
            detector(&[]),
            text,
            analyzer(),
        );

        let report = pipeline.process_frame(&Frame::filled(64, 64, [0, 0, 0])).unwrap();
        assert_eq!(calls.get(), 1);
        let target = report.target.unwrap();
        assert_eq!(target.bbox, BoundingBox::new(0, 2, 8, 6));
        assert!((target.distance_m - 1.0).abs() < 1e-3);
        assert_eq!(
            report.announcement.unwrap().subject,
            Subject::Target("bakery".into())
        );
    }

    #[test]
    fn test_detector_failure_is_inference_error() {
        let released = Rc::new(Cell::new(0));
        let mut broken = detector(&[]);
        broken.fail = true;
        let mut pipeline = NavigationPipeline::new(depth(&released), broken, analyzer());
        let err = pipeline
            .process_frame(&Frame::filled(8, 8, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, NavError::Inference { stage: "detection", .. }));
    }

    #[test]
    fn test_release_once() {
        let released = Rc::new(Cell::new(0));
        {
            let mut pipeline = NavigationPipeline::new(depth(&released), detector(&[]), analyzer());
            pipeline.release();
            pipeline.release();
            assert!(matches!(
                pipeline.process_frame(&Frame::filled(8, 8, [0, 0, 0])),
                Err(NavError::Released)
            ));
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_release_on_drop() {
        let released = Rc::new(Cell::new(0));
        drop(NavigationPipeline::new(depth(&released), detector(&[]), analyzer()));
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_run_drains_slot() {
        let released = Rc::new(Cell::new(0));
        let mut pipeline = NavigationPipeline::new(depth(&released), detector(&[]), analyzer());
        let slot = LatestFrameSlot::new();
        slot.offer(Frame::filled(16, 16, [1, 2, 3]));
        slot.close();

        let mut reports = Vec::new();
        let n = pipeline.run(&slot, |r| reports.push(r));
        assert_eq!(n, 1);
        assert_eq!(reports.len(), 1);
        assert_eq!(pipeline.frames_processed(), 1);
    }
}
