use super::Detection;

/// Greedy non-maximum suppression.
///
/// Candidates are visited by descending score; each one survives unless a
/// survivor already overlaps it with IoU above `iou_threshold`. Survivors
/// come back in descending score order, so running this twice changes
/// nothing.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        if kept
            .iter()
            .all(|k| k.rect.iou(&candidate.rect) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
