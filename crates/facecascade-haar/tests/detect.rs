use std::sync::Arc;

use facecascade_core::{CountingObserver, DetectionWindow, GrayImage, IntegralImage};
use facecascade_haar::{
    parse_cascade, scan_cascade, suppress, Cascade, FaceDetector, Feature, FeatureKind,
    LoaderParams, ScanParams, Stage, SuppressionParams, WeakClassifier,
};

/// Cascade whose single classifier fires on a dark left half next to a bright
/// right half of the 24x24 base window.
fn edge_cascade() -> Cascade {
    let mut f = Feature::new(FeatureKind::TwoHorizontal, 0, 0, 24, 24);
    // value = left - right; pass when value * 1 < -1000 * 1
    f.threshold = -1000.0;
    f.left_val = 1.0;
    f.right_val = 1.0;
    Cascade::with_stages(
        24,
        24,
        vec![Stage::with_classifiers(1.0, vec![WeakClassifier::new(f, 1.0)])],
    )
}

fn half_dark_frame(width: usize, height: usize, split: usize) -> GrayImage {
    let mut img = GrayImage::filled(width, height, 220);
    for y in 0..height {
        for x in 0..split.min(width) {
            img.data[y * width + x] = 20;
        }
    }
    img
}

#[test]
fn uniform_frame_with_empty_stage_yields_nothing() {
    let frame = GrayImage::filled(100, 100, 128);
    let cascade = Cascade::with_stages(24, 24, vec![Stage::new(0.0)]);
    assert!(!cascade.is_loaded());

    let ii = IntegralImage::new(&frame.view());
    let raw = scan_cascade(&cascade, &ii, &ScanParams::with_sizes(24, 400, 1.25));
    assert!(raw.windows.is_empty());

    let detector = FaceDetector::new(cascade);
    assert!(detector.detect_faces(&ii).is_empty());
}

#[test]
fn overlapping_pair_collapses_to_one() {
    let out = suppress(
        &[DetectionWindow::new(10, 10, 50), DetectionWindow::new(20, 20, 50)],
        &SuppressionParams {
            overlap_threshold: 0.3,
            ..SuppressionParams::default()
        },
    );
    assert_eq!(out, vec![DetectionWindow::new(10, 10, 50)]);
}

#[test]
fn edge_is_found_near_the_split() {
    let frame = half_dark_frame(120, 80, 60);
    let counts = Arc::new(CountingObserver::new());
    let detector = FaceDetector::new(edge_cascade())
        .with_scan_params(ScanParams::with_sizes(48, 48, 1.25))
        .with_observer(counts.clone());

    // Scale 2 keeps both halves of the feature the same width.
    let faces = detector.detect_frame(&frame.view());
    assert!(!faces.is_empty());
    for face in &faces {
        // Every kept window straddles the dark/bright boundary.
        assert!(u64::from(face.x) < 60 && face.right() > 60, "{face:?}");
    }

    let snapshot = counts.snapshot();
    assert_eq!(snapshot.scans, 1);
    assert!(snapshot.candidates >= faces.len() as u64);
}

#[test]
fn oversized_window_range_is_clamped() {
    let frame = half_dark_frame(70, 45, 30);
    let ii = IntegralImage::new(&frame.view());
    let params = ScanParams::with_sizes(24, 5000, 1.25);
    assert!(params.window_sizes(70, 45).iter().all(|&s| s <= 45));

    let raw = scan_cascade(&edge_cascade(), &ii, &params);
    assert!(raw
        .windows
        .iter()
        .all(|w| w.right() <= 70 && w.bottom() <= 45));
}

#[test]
fn detections_depend_only_on_the_frame() {
    let frame = half_dark_frame(96, 96, 40);
    let detector = FaceDetector::new(edge_cascade());
    let a = detector.detect_frame(&frame.view());
    let b = detector.clone().detect_frame(&frame.view());
    assert_eq!(a, b);
}

#[test]
fn oversized_rectangle_in_cascade_file_scans_without_overflow() {
    let text = "<c><size>24 24</size><stages><_>
        <stage_threshold>0.5</stage_threshold>
        <trees><_><_>
          <feature><rects><_>0 0 2000000000 24 -1.</_></rects></feature>
          <threshold>0.1</threshold>
        </_></_></trees></_></stages></c>";
    let cascade = parse_cascade(text, &LoaderParams::default()).expect("cascade");
    assert_eq!(cascade.stages()[0].classifiers()[0].feature.width, 2_000_000_000);

    let frame = half_dark_frame(60, 60, 25);
    let ii = IntegralImage::new(&frame.view());
    let raw = scan_cascade(&cascade, &ii, &ScanParams::default());
    assert!(raw
        .windows
        .iter()
        .all(|w| w.right() <= 60 && w.bottom() <= 60));
    let faces = FaceDetector::new(cascade).detect_frame(&frame.view());
    assert!(faces.len() <= raw.windows.len());
}
