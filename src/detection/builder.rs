//! Builder for creating Detection objects from various box formats.

use super::{Detection, Rect};

/// Builder for [`Detection`] values, used by the decoder and by
/// collaborators that produce detections from their own model formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    rect: Rect,
    score: f32,
    class_index: usize,
    label: Option<String>,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.rect = Rect::new(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.rect = Rect::from_xywh(cx, cy, w, h);
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn class(mut self, class_index: usize) -> Self {
        self.class_index = class_index;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the final detection. Without an explicit label the class is
    /// named `Class{index}`.
    pub fn build(self) -> Detection {
        let label = self
            .label
            .unwrap_or_else(|| format!("Class{}", self.class_index));
        Detection {
            rect: self.rect,
            class_index: self.class_index,
            score: self.score,
            label,
        }
    }
}
