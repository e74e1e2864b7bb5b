use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{DetectionBuilder, Letterbox, Rect, non_max_suppression};
use crate::error::{ConfigError, NavError};
use crate::geometry::BoundingBox;

/// A decoded detection in original-image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub rect: Rect,
    pub class_index: usize,
    /// Best class score, in `[0, 1]`.
    pub score: f32,
    pub label: String,
}

impl Detection {
    /// Integer box with truncated coordinates.
    pub fn bbox(&self) -> BoundingBox {
        self.rect.to_bounding_box()
    }
}

/// Detector tensor layout and filtering thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Side of the square detector input.
    pub input_size: u32,
    pub num_classes: usize,
    /// Number of anchor-free cells (columns of the tensor).
    pub num_cells: usize,
    /// Cells whose best class score is below this are dropped. Kept low on
    /// purpose; suppression does the real filtering.
    pub confidence_threshold: f32,
    /// Overlap above which a lower-scoring box is suppressed.
    pub iou_threshold: f32,
    /// Class names; empty means `Class{i}`.
    pub labels: Vec<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            input_size: 640,
            num_classes: 13,
            num_cells: 8400,
            confidence_threshold: 0.01,
            iou_threshold: 0.2,
            labels: Vec::new(),
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_size == 0 {
            return Err(ConfigError::InvalidResolution(0));
        }
        if self.num_classes == 0 {
            return Err(ConfigError::InvalidThreshold {
                name: "num_classes",
                range: "[1, inf)",
                value: 0.0,
            });
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("iou_threshold", self.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name,
                    range: "[0, 1]",
                    value: value as f64,
                });
            }
        }
        Ok(())
    }

    /// Expected tensor shape: `(4 + num_classes, num_cells)`.
    pub fn tensor_shape(&self) -> (usize, usize) {
        (4 + self.num_classes, self.num_cells)
    }
}

/// Decodes anchor-free detector output and suppresses duplicates.
#[derive(Debug, Clone)]
pub struct DetectionDecoder {
    config: DecoderConfig,
}

impl DetectionDecoder {
    pub fn new(config: DecoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn label(&self, class_index: usize) -> Option<&str> {
        self.config.labels.get(class_index).map(String::as_str)
    }

    /// Decode a `(4 + C) x N` tensor (batch dimension already removed).
    ///
    /// An empty result means nothing was found; a wrongly shaped tensor is
    /// [`NavError::MalformedTensor`].
    pub fn decode(
        &self,
        raw: ArrayView2<'_, f32>,
        letterbox: &Letterbox,
    ) -> Result<Vec<Detection>, NavError> {
        let expected = self.config.tensor_shape();
        if raw.dim() != expected {
            return Err(NavError::MalformedTensor {
                expected,
                got: raw.dim(),
            });
        }

        let mut candidates = Vec::new();
        for (cell, column) in raw.axis_iter(Axis(1)).enumerate() {
            let Some((class_index, score)) = best_class(&column) else {
                continue;
            };
            if score < self.config.confidence_threshold {
                continue;
            }

            let letterboxed = Rect::from_xywh(column[0], column[1], column[2], column[3]);
            let (x1, y1) = letterbox.to_original(letterboxed.x1, letterboxed.y1);
            let (x2, y2) = letterbox.to_original(letterboxed.x2, letterboxed.y2);

            let mut builder = DetectionBuilder::new()
                .tlbr(x1, y1, x2, y2)
                .score(score)
                .class(class_index);
            if let Some(label) = self.label(class_index) {
                builder = builder.label(label);
            }
            trace!(cell, class_index, score, "candidate");
            candidates.push(builder.build());
        }

        let found = candidates.len();
        let kept = non_max_suppression(candidates, self.config.iou_threshold);
        debug!(candidates = found, kept = kept.len(), "decoded detections");
        Ok(kept)
    }

    /// Decode a flat row-major buffer of the configured shape.
    pub fn decode_slice(&self, raw: &[f32], letterbox: &Letterbox) -> Result<Vec<Detection>, NavError> {
        let expected = self.config.tensor_shape();
        let view = ArrayView2::from_shape(expected, raw).map_err(|_| NavError::MalformedTensor {
            expected,
            got: (1, raw.len()),
        })?;
        self.decode(view, letterbox)
    }

    /// Decode and keep only the integer boxes.
    pub fn decode_boxes(
        &self,
        raw: ArrayView2<'_, f32>,
        letterbox: &Letterbox,
    ) -> Result<Vec<BoundingBox>, NavError> {
        Ok(self
            .decode(raw, letterbox)?
            .iter()
            .map(Detection::bbox)
            .collect())
    }
}

/// Index and value of the highest finite class score in one tensor column;
/// the first index wins ties.
fn best_class(column: &ArrayView1<'_, f32>) -> Option<(usize, f32)> {
    column
        .iter()
        .skip(4)
        .copied()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .fold(None, |best, (i, s)| match best {
            Some((_, b)) if !(s > b) => best,
            _ => Some((i, s)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn small_config() -> DecoderConfig {
        DecoderConfig {
            num_classes: 3,
            num_cells: 4,
            ..DecoderConfig::default()
        }
    }

    fn put_cell(raw: &mut Array2<f32>, cell: usize, xywh: [f32; 4], scores: &[f32]) {
        for (row, v) in xywh.iter().chain(scores).enumerate() {
            raw[[row, cell]] = *v;
        }
    }

    #[test]
    fn test_decode_picks_best_class() {
        let decoder = DetectionDecoder::new(small_config()).unwrap();
        let mut raw = Array2::zeros((7, 4));
        put_cell(&mut raw, 1, [100.0, 100.0, 40.0, 20.0], &[0.1, 0.8, 0.3]);

        let dets = decoder.decode(raw.view(), &Letterbox::identity(640)).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_index, 1);
        assert_eq!(dets[0].score, 0.8);
        assert_eq!(dets[0].label, "Class1");
        assert_eq!(dets[0].rect, Rect::new(80.0, 90.0, 120.0, 110.0));
    }

    #[test]
    fn test_nan_scores_ignored() {
        let decoder = DetectionDecoder::new(small_config()).unwrap();
        let mut raw = Array2::zeros((7, 4));
        put_cell(&mut raw, 0, [100.0, 100.0, 40.0, 40.0], &[0.9, 0.0, 0.0]);
        // overlaps cell 0 almost entirely
        put_cell(&mut raw, 1, [102.0, 100.0, 40.0, 40.0], &[f32::NAN, 0.0, 0.0]);
        put_cell(&mut raw, 2, [300.0, 300.0, 10.0, 10.0], &[f32::NAN, f32::NAN, f32::NAN]);

        let dets = decoder.decode(raw.view(), &Letterbox::identity(640)).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].score, 0.9);
        assert_eq!(dets[0].class_index, 0);
        assert!(dets.iter().all(|d| d.score.is_finite()));
    }

    #[test]
    fn test_low_scores_dropped() {
        let decoder = DetectionDecoder::new(small_config()).unwrap();
        let mut raw = Array2::zeros((7, 4));
        put_cell(&mut raw, 0, [10.0, 10.0, 4.0, 4.0], &[0.005, 0.009, 0.0]);
        assert!(decoder.decode(raw.view(), &Letterbox::identity(640)).unwrap().is_empty());
    }

    #[test]
    fn test_de_letterbox_and_clamp() {
        let decoder = DetectionDecoder::new(small_config()).unwrap();
        let mut raw = Array2::zeros((7, 4));
        // 1280x720 -> scale 0.5, pad_y 140
        put_cell(&mut raw, 2, [320.0, 150.0, 100.0, 40.0], &[0.9, 0.0, 0.0]);

        let lb = Letterbox::fit(1280, 720, 640).unwrap();
        let dets = decoder.decode(raw.view(), &lb).unwrap();
        assert_eq!(dets[0].rect, Rect::new(540.0, 0.0, 740.0, 60.0));
        assert_eq!(dets[0].bbox(), BoundingBox::new(540, 0, 740, 60));
    }

    #[test]
    fn test_configured_labels() {
        let config = DecoderConfig {
            labels: vec!["person".into(), "pole".into(), "car".into()],
            ..small_config()
        };
        let decoder = DetectionDecoder::new(config).unwrap();
        let mut raw = Array2::zeros((7, 4));
        put_cell(&mut raw, 3, [50.0, 50.0, 10.0, 10.0], &[0.0, 0.0, 0.7]);
        let dets = decoder.decode(raw.view(), &Letterbox::identity(640)).unwrap();
        assert_eq!(dets[0].label, "car");
    }

    #[test]
    fn test_duplicates_suppressed() {
        let decoder = DetectionDecoder::new(small_config()).unwrap();
        let mut raw = Array2::zeros((7, 4));
        put_cell(&mut raw, 0, [100.0, 100.0, 40.0, 40.0], &[0.5, 0.0, 0.0]);
        put_cell(&mut raw, 1, [102.0, 101.0, 40.0, 40.0], &[0.0, 0.7, 0.0]);
        let dets = decoder.decode(raw.view(), &Letterbox::identity(640)).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].score, 0.7);
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let decoder = DetectionDecoder::new(small_config()).unwrap();
        let raw = Array2::<f32>::zeros((6, 4));
        let err = decoder.decode(raw.view(), &Letterbox::identity(640)).unwrap_err();
        assert!(matches!(
            err,
            NavError::MalformedTensor {
                expected: (7, 4),
                got: (6, 4)
            }
        ));

        let err = decoder.decode_slice(&[0.0; 27], &Letterbox::identity(640)).unwrap_err();
        assert!(matches!(err, NavError::MalformedTensor { got: (1, 27), .. }));
    }

    #[test]
    fn test_decode_slice_matches_view() {
        let decoder = DetectionDecoder::new(small_config()).unwrap();
        let mut raw = Array2::zeros((7, 4));
        put_cell(&mut raw, 1, [100.0, 100.0, 40.0, 20.0], &[0.1, 0.8, 0.3]);
        let flat: Vec<f32> = raw.iter().copied().collect();
        assert_eq!(
            decoder.decode_slice(&flat, &Letterbox::identity(640)).unwrap(),
            decoder.decode(raw.view(), &Letterbox::identity(640)).unwrap()
        );
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let config = DecoderConfig {
            iou_threshold: 1.5,
            ..DecoderConfig::default()
        };
        assert!(matches!(
            DetectionDecoder::new(config),
            Err(ConfigError::InvalidThreshold { name: "iou_threshold", .. })
        ));
    }
}
