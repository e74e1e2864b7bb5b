use std::sync::Arc;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::NavConfig;
use crate::depth::{AbsoluteDepthMap, DepthCalibrator, RelativeDepthMap, SafeDistanceMap};
use crate::detection::{DetectionDecoder, Letterbox};
use crate::error::NavError;
use crate::fusion::{Announcement, BoxDistance, HazardLocator, HazardResult, Sector};
use crate::geometry::{BoundingBox, scale_boxes};

/// Text regions from the recognizer plus the one the keyword matcher picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    /// Boxes in text-recognizer input space.
    pub boxes: Vec<BoundingBox>,
    pub index: usize,
    /// The matched text, spoken with the target.
    pub text: String,
}

impl TextMatch {
    pub fn new(boxes: Vec<BoundingBox>, index: usize, text: impl Into<String>) -> Self {
        Self {
            boxes,
            index,
            text: text.into(),
        }
    }

    pub fn selected(&self) -> Option<BoundingBox> {
        self.boxes.get(self.index).copied()
    }
}

/// How a presentation layer should draw a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayMode {
    Hazard,
    /// The located text target.
    Related,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayBox {
    pub bbox: BoundingBox,
    pub mode: OverlayMode,
}

/// A located text target in depth-map space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub bbox: BoundingBox,
    pub distance_m: f32,
    pub sector: Sector,
    pub text: String,
}

/// Everything one frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Detected boxes in depth-map space.
    pub boxes: Vec<BoundingBox>,
    /// Metric depth, all zeros when calibration failed.
    pub depth: AbsoluteDepthMap,
    pub calibrated: bool,
    pub hazard: Option<HazardResult>,
    pub target: Option<TargetReport>,
    pub announcement: Option<Announcement>,
    pub overlays: Vec<OverlayBox>,
}

impl FrameReport {
    fn empty(boxes: Vec<BoundingBox>, depth: AbsoluteDepthMap, calibrated: bool) -> Self {
        Self {
            boxes,
            depth,
            calibrated,
            hazard: None,
            target: None,
            announcement: None,
            overlays: Vec::new(),
        }
    }

    pub fn has_hazard(&self) -> bool {
        self.hazard.is_some()
    }
}

/// Per-frame sequence: decode, rescale, calibrate, fuse.
///
/// Holds only read-only state, so one analyzer can serve frames from any
/// thread.
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    decoder: DetectionDecoder,
    calibrator: DepthCalibrator,
    locator: HazardLocator,
    depth_resolution: usize,
    ocr_resolution: usize,
}

impl FrameAnalyzer {
    /// Validate `config` and build every stage, including the safe map.
    pub fn new(config: &NavConfig) -> Result<Self, NavError> {
        config.validate()?;
        let decoder = DetectionDecoder::new(config.detector.clone())?;
        let calibrator = DepthCalibrator::from_config(&config.calibration)?;
        let safe_map = SafeDistanceMap::build(config.depth_resolution, &config.safe_map)?;
        let locator = HazardLocator::new(Arc::new(safe_map), config.fusion.clone())?;
        info!(
            depth_resolution = config.depth_resolution,
            detector_input = config.detector.input_size,
            "frame analyzer ready"
        );
        Ok(Self {
            decoder,
            calibrator,
            locator,
            depth_resolution: config.depth_resolution,
            ocr_resolution: config.ocr_resolution,
        })
    }

    pub fn depth_resolution(&self) -> usize {
        self.depth_resolution
    }

    pub fn ocr_resolution(&self) -> usize {
        self.ocr_resolution
    }

    /// Side of the square frame the detector expects.
    pub fn detector_input_size(&self) -> u32 {
        self.decoder.config().input_size
    }

    pub fn safe_map(&self) -> &SafeDistanceMap {
        self.locator.safe_map()
    }

    /// Decode a detector tensor computed on a square detector-input frame
    /// and rescale the boxes into depth-map space. Malformed tensors count
    /// as no detections.
    pub fn detect_boxes(&self, raw: ArrayView2<'_, f32>) -> Vec<BoundingBox> {
        let input_size = self.detector_input_size();
        let boxes = match self
            .decoder
            .decode_boxes(raw, &Letterbox::identity(input_size))
        {
            Ok(boxes) => boxes,
            Err(e) => {
                warn!(error = %e, "dropping detector output");
                Vec::new()
            }
        };
        scale_boxes(&boxes, input_size, self.depth_resolution as u32)
    }

    /// Bring relative depth to the configured resolution and calibrate it.
    pub fn try_calibrate(&self, relative: &RelativeDepthMap) -> Result<AbsoluteDepthMap, NavError> {
        let res = self.depth_resolution;
        let resampled;
        let relative = if relative.width() != res || relative.height() != res {
            debug!(
                width = relative.width(),
                height = relative.height(),
                res,
                "resampling depth"
            );
            resampled = relative.resample(res);
            &resampled
        } else {
            relative
        };

        Ok(self.calibrator.try_apply(relative)?)
    }

    /// Like [`try_calibrate`](Self::try_calibrate), but never fails.
    ///
    /// Returns the metric map and whether calibration succeeded; on failure
    /// the map is all zeros.
    pub fn calibrate(&self, relative: &RelativeDepthMap) -> (AbsoluteDepthMap, bool) {
        match self.try_calibrate(relative) {
            Ok(depth) => (depth, true),
            Err(e) => {
                warn!(error = %e, "depth calibration failed, skipping fusion");
                let res = self.depth_resolution;
                (AbsoluteDepthMap::zeros(res, res), false)
            }
        }
    }

    pub fn check_hazard(&self, depth: &AbsoluteDepthMap, boxes: &[BoundingBox]) -> Option<HazardResult> {
        self.locator.check(depth, boxes)
    }

    /// Locate the matched text region, rescaled from text-recognizer space.
    pub fn locate_text(
        &self,
        depth: &AbsoluteDepthMap,
        text: &TextMatch,
    ) -> Option<(BoundingBox, BoxDistance)> {
        let Some(selected) = text.selected() else {
            debug!(index = text.index, boxes = text.boxes.len(), "text match index out of range");
            return None;
        };
        let bbox = scale_boxes(
            &[selected],
            self.ocr_resolution as u32,
            self.depth_resolution as u32,
        )
        .into_iter()
        .next()?;
        self.locator
            .locate_target(depth, bbox)
            .map(|fix| (bbox, fix))
    }

    /// Run the full sequence on already materialized model outputs.
    ///
    /// `text` is consulted only when the frame has no hazard.
    pub fn analyze(
        &self,
        relative: &RelativeDepthMap,
        raw_detections: ArrayView2<'_, f32>,
        text: Option<&TextMatch>,
    ) -> FrameReport {
        let mut report = self.begin(relative, raw_detections);
        if !report.calibrated || self.apply_hazard(&mut report) {
            return report;
        }
        if let Some(text) = text {
            self.apply_target(&mut report, text);
        }
        report
    }

    /// Fill in the hazard fields; true when a hazard was found.
    pub(crate) fn apply_hazard(&self, report: &mut FrameReport) -> bool {
        let Some(hazard) = self.check_hazard(&report.depth, &report.boxes) else {
            return false;
        };
        debug!(
            box_index = hazard.box_index,
            distance_m = hazard.distance_m,
            sector = hazard.sector.code(),
            "hazard"
        );
        report.overlays.push(OverlayBox {
            bbox: report.boxes[hazard.box_index],
            mode: OverlayMode::Hazard,
        });
        report.announcement = Announcement::for_hazard(&hazard);
        report.hazard = Some(hazard);
        true
    }

    pub(crate) fn apply_target(&self, report: &mut FrameReport, text: &TextMatch) {
        let Some((bbox, fix)) = self.locate_text(&report.depth, text) else {
            return;
        };
        debug!(distance_m = fix.distance_m, text = %text.text, "target located");
        report.overlays.push(OverlayBox {
            bbox,
            mode: OverlayMode::Related,
        });
        report.announcement = Some(Announcement::for_target(&fix, text.text.as_str()));
        report.target = Some(TargetReport {
            bbox,
            distance_m: fix.distance_m,
            sector: fix.sector,
            text: text.text.clone(),
        });
    }

    /// Prepare an empty report from model outputs, with calibration done.
    pub(crate) fn begin(
        &self,
        relative: &RelativeDepthMap,
        raw_detections: ArrayView2<'_, f32>,
    ) -> FrameReport {
        let boxes = self.detect_boxes(raw_detections);
        let (depth, calibrated) = self.calibrate(relative);
        FrameReport::empty(boxes, depth, calibrated)
    }
}
