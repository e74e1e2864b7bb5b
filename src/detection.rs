//! Raw detector output to filtered, de-duplicated boxes.
//!
//! The detector emits a `(4 + C) x N` tensor: rows 0..4 hold center x,
//! center y, width and height in letterboxed pixels, rows 4.. hold one
//! score per class. [`DetectionDecoder`] picks the best class per cell,
//! undoes the letterbox and runs greedy non-maximum suppression.

mod builder;
mod decoder;
mod letterbox;
mod nms;
mod rect;

pub use builder::DetectionBuilder;
pub use decoder::{DecoderConfig, Detection, DetectionDecoder};
pub use letterbox::Letterbox;
pub use nms::non_max_suppression;
pub use rect::Rect;
