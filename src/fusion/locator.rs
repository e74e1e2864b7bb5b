use serde::{Deserialize, Serialize};

use super::Sector;
use crate::depth::AbsoluteDepthMap;
use crate::geometry::BoundingBox;

/// Distance and direction of one box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxDistance {
    pub distance_m: f32,
    pub sector: Sector,
}

/// Pixels of `bbox` on a `step` grid anchored at its top-left corner,
/// skipping anything outside a `width x height` map.
pub(crate) fn grid_samples(
    bbox: BoundingBox,
    step: usize,
    width: usize,
    height: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let step = step.max(1);
    (bbox.y1..bbox.y2)
        .step_by(step)
        .flat_map(move |y| (bbox.x1..bbox.x2).step_by(step).map(move |x| (x, y)))
        .filter(move |&(x, y)| x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height)
        .map(|(x, y)| (x as usize, y as usize))
}

/// Smallest depth inside `bbox`, sampled every `grid_step` pixels, and the
/// sector of the box center.
///
/// `None` when no pixel was visited (empty box or box outside the map).
pub fn nearest_distance(
    depth: &AbsoluteDepthMap,
    bbox: BoundingBox,
    grid_step: usize,
) -> Option<BoxDistance> {
    let view = depth.view();
    let distance_m = grid_samples(bbox, grid_step, depth.width(), depth.height())
        .map(|(x, y)| view[[y, x]])
        .filter(|d| !d.is_nan())
        .reduce(f32::min)?;

    Some(BoxDistance {
        distance_m,
        sector: Sector::from_center(bbox.center_x(), depth.width()),
    })
}
