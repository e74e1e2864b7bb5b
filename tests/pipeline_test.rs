use navsight_rs::fusion::Subject;
use navsight_rs::{
    BoundingBox, DetectionDecoder, FrameAnalyzer, Letterbox, NavConfig, OverlayMode,
    RelativeDepthMap, Sector, TextMatch, scale_boxes,
};
use ndarray::Array2;

const DEPTH_RES: usize = 320;

/// Detector tensor at the reference shape (17 x 8400) where every class
/// scores 0.001 except class 2 of cell 0.
fn single_hit_tensor(cx: f32, cy: f32, w: f32, h: f32) -> Array2<f32> {
    let config = NavConfig::default();
    let mut tensor = Array2::from_elem(config.detector.tensor_shape(), 0.001);
    for cell in 0..tensor.ncols() {
        tensor[[0, cell]] = 40.0 + (cell % 80) as f32 * 7.0;
        tensor[[1, cell]] = 40.0 + (cell / 80) as f32 * 5.0;
        tensor[[2, cell]] = 30.0;
        tensor[[3, cell]] = 30.0;
    }
    tensor[[0, 0]] = cx;
    tensor[[1, 0]] = cy;
    tensor[[2, 0]] = w;
    tensor[[3, 0]] = h;
    tensor[[4 + 2, 0]] = 0.9;
    tensor
}

/// Inverse-distance relative depth for a floor that matches the default
/// calibration points, with an optional patch at `meters`.
fn scene(patch: Option<(BoundingBox, f32)>) -> RelativeDepthMap {
    RelativeDepthMap::from_array(Array2::from_shape_fn((DEPTH_RES, DEPTH_RES), |(y, x)| {
        let mut d = (7.0 - 5.25 * y as f32 / 255.0).max(1.0);
        if let Some((b, meters)) = patch {
            let (x, y) = (x as i32, y as i32);
            if x >= b.x1 && x < b.x2 && y >= b.y1 && y < b.y2 {
                d = meters;
            }
        }
        1.0 / d
    }))
}

#[test]
fn test_single_hit_decodes_to_one_box() {
    let decoder = DetectionDecoder::new(NavConfig::default().detector).unwrap();
    let tensor = single_hit_tensor(320.0, 480.0, 100.0, 80.0);

    let detections = decoder.decode(tensor.view(), &Letterbox::identity(640)).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_index, 2);
    assert_eq!(detections[0].label, "Class2");
    assert!((detections[0].score - 0.9).abs() < 1e-6);

    let bbox = detections[0].bbox();
    assert_eq!(bbox, BoundingBox::new(270, 440, 370, 520));

    let scaled = scale_boxes(&[bbox], 640, 320);
    assert_eq!(scaled, vec![BoundingBox::new(135, 220, 185, 260)]);
}

#[test]
fn test_near_obstacle_is_hazard() {
    let analyzer = FrameAnalyzer::new(&NavConfig::default()).unwrap();
    // (260, 500)-(380, 620) at 640 px
    let tensor = single_hit_tensor(320.0, 560.0, 120.0, 120.0);
    let obstacle = BoundingBox::new(130, 250, 190, 310);

    let report = analyzer.analyze(&scene(Some((obstacle, 1.2))), tensor.view(), None);
    assert!(report.calibrated);
    assert_eq!(report.boxes, vec![obstacle]);

    let hazard = report.hazard.expect("hazard");
    assert_eq!(hazard.box_index, 0);
    assert!((hazard.distance_m - 1.2).abs() < 1e-3);
    assert_eq!(hazard.sector, Sector::Front);

    let announcement = report.announcement.expect("announcement");
    assert_eq!(announcement.sector_code(), "F");
    assert_eq!(announcement.distance_band, 1);
    assert_eq!(announcement.subject, Subject::Obstacle);
    assert_eq!(report.overlays.len(), 1);
    assert_eq!(report.overlays[0].mode, OverlayMode::Hazard);
}

#[test]
fn test_distant_obstacle_is_not_hazard() {
    let analyzer = FrameAnalyzer::new(&NavConfig::default()).unwrap();
    let tensor = single_hit_tensor(320.0, 560.0, 120.0, 120.0);
    let obstacle = BoundingBox::new(130, 250, 190, 310);

    let report = analyzer.analyze(&scene(Some((obstacle, 4.0))), tensor.view(), None);
    assert!(report.hazard.is_none());
    assert!(report.announcement.is_none());
}

#[test]
fn test_text_target_when_no_hazard() {
    let analyzer = FrameAnalyzer::new(&NavConfig::default()).unwrap();
    let nothing = Array2::from_elem(NavConfig::default().detector.tensor_shape(), 0.001);
    let text = TextMatch::new(
        vec![BoundingBox::new(500, 400, 600, 440), BoundingBox::new(0, 0, 64, 64)],
        1,
        "pharmacy",
    );

    let report = analyzer.analyze(&scene(None), nothing.view(), Some(&text));
    assert!(report.hazard.is_none());

    let target = report.target.expect("target");
    assert_eq!(target.bbox, BoundingBox::new(0, 0, 32, 32));
    // nearest sampled row is 30
    let expected = 7.0 - 5.25 * 30.0 / 255.0;
    assert!((target.distance_m - expected).abs() < 1e-2);
    assert_eq!(target.sector, Sector::Left);

    let announcement = report.announcement.expect("announcement");
    assert_eq!(announcement.distance_band, 5);
    assert_eq!(announcement.subject, Subject::Target("pharmacy".into()));
}

#[test]
fn test_zero_depth_frame_is_neutral() {
    let analyzer = FrameAnalyzer::new(&NavConfig::default()).unwrap();
    let tensor = single_hit_tensor(320.0, 560.0, 120.0, 120.0);
    let report = analyzer.analyze(
        &RelativeDepthMap::zeros(DEPTH_RES, DEPTH_RES),
        tensor.view(),
        None,
    );
    assert!(!report.calibrated);
    assert!(report.hazard.is_none());
    assert_eq!(report.depth.max_value(), Some(0.0));
}
