//! Box rescaling between square processing resolutions.

use tracing::warn;

use super::BoundingBox;

/// Rescale boxes from a `from_size` square space into a `to_size` square space.
///
/// Every coordinate is multiplied by `to_size / from_size` and truncated
/// toward zero. No clamping is done. A zero `from_size` has no meaningful
/// scale, so the boxes are returned unchanged.
pub fn scale_boxes(boxes: &[BoundingBox], from_size: u32, to_size: u32) -> Vec<BoundingBox> {
    if from_size == 0 {
        warn!(to_size, "cannot rescale boxes from a zero-sized space");
        return boxes.to_vec();
    }
    // Exact rational scaling; i64 division truncates toward zero.
    let apply = |c: i32| (c as i64 * to_size as i64 / from_size as i64) as i32;

    boxes
        .iter()
        .map(|b| BoundingBox::new(apply(b.x1), apply(b.y1), apply(b.x2), apply(b.y2)))
        .collect()
}
