use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use facecascade_core::{CountingObserver, GrayImage};
use facecascade_haar::{Cascade, FaceDetector, Feature, FeatureKind, Stage, WeakClassifier};
use facecascade_pipeline::{DetectionPipeline, PipelineParams, PipelineState, SubmitOutcome};

fn accept_all() -> Cascade {
    let mut f = Feature::new(FeatureKind::FourSquare, 0, 0, 24, 24);
    f.threshold = 1.0;
    f.left_val = 1.0;
    f.right_val = 1.0;
    Cascade::with_stages(
        24,
        24,
        vec![Stage::with_classifiers(1.0, vec![WeakClassifier::new(f, 1.0)])],
    )
}

const STUMP_CASCADE: &str = "<c><stages><_><stageThreshold>0.5</stageThreshold><weakClassifiers><_>\
     <internalNodes>0 -1 0 1.0</internalNodes><leafValues>1 1</leafValues>\
     </_></weakClassifiers></_></stages></c>";

fn write_cascade(dir: &Path) -> PathBuf {
    let path = dir.join("cascade.xml");
    std::fs::write(&path, STUMP_CASCADE).expect("write cascade");
    path
}

/// Run `f` on its own thread; `None` if it has not returned within `timeout`.
fn within<T: Send + 'static>(
    timeout: Duration,
    f: impl FnOnce() -> T + Send + 'static,
) -> Option<T> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(timeout).ok()
}

fn fast_params() -> PipelineParams {
    PipelineParams {
        poll_interval_ms: 10,
        min_detection_interval_ms: 0,
        ..PipelineParams::default()
    }
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn burst_of_frames_never_exceeds_capacity_or_blocks() {
    let counts = Arc::new(CountingObserver::new());
    let detector = FaceDetector::new(accept_all()).with_observer(counts.clone());
    let pipeline = DetectionPipeline::new(detector, PipelineParams::default());

    let mut outcomes = Vec::new();
    for _ in 0..10 {
        let started = Instant::now();
        outcomes.push(pipeline.submit_frame(GrayImage::filled(64, 48, 90)));
        assert!(started.elapsed() < Duration::from_millis(250));
        assert!(pipeline.queue_len() <= 5);
    }
    assert_eq!(outcomes[..5], [SubmitOutcome::Queued; 5]);
    assert_eq!(outcomes[5..], [SubmitOutcome::QueuedDroppedOldest; 5]);
    assert_eq!(pipeline.queue_len(), 5);
    assert_eq!(counts.snapshot().frames_dropped, 5);

    // Same burst against a running worker.
    pipeline.start().expect("start");
    for _ in 0..10 {
        let started = Instant::now();
        pipeline.submit_frame(GrayImage::filled(64, 48, 90));
        assert!(started.elapsed() < Duration::from_millis(250));
        assert!(pipeline.queue_len() <= 5);
    }
}

#[test]
fn worker_publishes_complete_sets() {
    let counts = Arc::new(CountingObserver::new());
    let detector = FaceDetector::new(accept_all()).with_observer(counts.clone());
    let pipeline = DetectionPipeline::new(detector, PipelineParams::default());
    pipeline.start().expect("start");
    assert!(pipeline.current_faces().is_empty());

    pipeline.submit_frame(GrayImage::filled(80, 80, 128));
    assert!(wait_until(Duration::from_secs(5), || !pipeline
        .current_faces()
        .is_empty()));

    let faces = pipeline.current_faces();
    for (i, a) in faces.iter().enumerate() {
        for b in &faces[i + 1..] {
            assert!(a.overlap_ratio(b) <= 0.3);
        }
    }
    assert!(counts.snapshot().published >= 1);

    pipeline.enable_face_detection(false);
    assert!(pipeline.current_faces().is_empty());
    assert_eq!(
        pipeline.submit_frame(GrayImage::filled(80, 80, 128)),
        SubmitOutcome::Ignored
    );
    pipeline.enable_face_detection(true);
    assert_eq!(
        pipeline.submit_frame(GrayImage::filled(80, 80, 128)),
        SubmitOutcome::Queued
    );
}

#[test]
fn detection_passes_respect_min_interval() {
    let counts = Arc::new(CountingObserver::new());
    let detector = FaceDetector::new(accept_all()).with_observer(counts.clone());
    let pipeline = DetectionPipeline::new(
        detector,
        PipelineParams {
            min_detection_interval_ms: 400,
            poll_interval_ms: 10,
            ..PipelineParams::default()
        },
    );
    pipeline.start().expect("start");

    let started = Instant::now();
    pipeline.submit_frame(GrayImage::filled(40, 40, 60));
    assert!(wait_until(Duration::from_secs(5), || counts
        .snapshot()
        .published
        == 1));
    pipeline.submit_frame(GrayImage::filled(40, 40, 60));
    assert!(wait_until(Duration::from_secs(5), || counts
        .snapshot()
        .published
        == 2));

    // The second pass cannot begin before the interval has elapsed.
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert!(counts.snapshot().frames_skipped >= 1);
}

#[test]
fn reload_swaps_cascade_and_keeps_running() {
    let pipeline = DetectionPipeline::new(FaceDetector::new(accept_all()), PipelineParams::default());
    pipeline.start().expect("start");
    assert!(pipeline.is_cascade_loaded());

    assert!(!pipeline.load_cascade("/nonexistent/cascade.xml"));
    assert!(!pipeline.is_cascade_loaded());
    assert_eq!(pipeline.state(), PipelineState::Running);
    assert!(pipeline.current_faces().is_empty());

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_cascade(dir.path());
    assert!(pipeline.load_cascade(&path));
    assert!(pipeline.is_cascade_loaded());
    assert_eq!(pipeline.state(), PipelineState::Running);
}

#[test]
fn drop_joins_running_worker() {
    let pipeline = DetectionPipeline::new(FaceDetector::new(accept_all()), PipelineParams::default());
    pipeline.start().expect("start");
    pipeline.submit_frame(GrayImage::filled(64, 64, 10));
    let started = Instant::now();
    drop(pipeline);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn concurrent_start_and_stop_always_return() {
    let pipeline = Arc::new(DetectionPipeline::new(
        FaceDetector::new(accept_all()),
        fast_params(),
    ));
    let p = Arc::clone(&pipeline);
    let settled = within(Duration::from_secs(60), move || {
        for _ in 0..300 {
            p.start().expect("start");
            let stopper = {
                let p = Arc::clone(&p);
                thread::spawn(move || p.stop())
            };
            let starter = {
                let p = Arc::clone(&p);
                thread::spawn(move || p.start())
            };
            stopper.join().expect("stop thread");
            starter.join().expect("start thread").expect("start");
        }
        p.stop();
        p.state()
    });
    assert_eq!(settled, Some(PipelineState::Idle));
    assert_eq!(pipeline.queue_len(), 0);
}

#[test]
fn reload_and_restart_while_a_producer_keeps_submitting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_cascade(dir.path());
    let pipeline = Arc::new(DetectionPipeline::new(
        FaceDetector::new(accept_all()),
        fast_params(),
    ));
    pipeline.start().expect("start");

    let producing = Arc::new(AtomicBool::new(true));
    let producer = {
        let p = Arc::clone(&pipeline);
        let producing = Arc::clone(&producing);
        thread::spawn(move || {
            let mut max_len = 0;
            while producing.load(Ordering::Relaxed) {
                p.submit_frame(GrayImage::filled(48, 48, 90));
                max_len = max_len.max(p.queue_len());
                thread::sleep(Duration::from_millis(1));
            }
            max_len
        })
    };

    let p = Arc::clone(&pipeline);
    let settled = within(Duration::from_secs(60), move || {
        let mut reloads = 0;
        for i in 0..20 {
            reloads += usize::from(p.load_cascade(&path));
            if i % 5 == 0 {
                p.stop();
                p.start().expect("restart");
            }
        }
        (reloads, p.state())
    });
    producing.store(false, Ordering::Relaxed);
    let max_len = producer.join().expect("producer");

    assert_eq!(settled, Some((20, PipelineState::Running)));
    assert!(max_len <= 5);
    assert!(pipeline.is_cascade_loaded());
}

#[test]
fn stop_races_with_final_drop() {
    for _ in 0..50 {
        let pipeline = Arc::new(DetectionPipeline::new(
            FaceDetector::new(accept_all()),
            fast_params(),
        ));
        pipeline.start().expect("start");
        pipeline.submit_frame(GrayImage::filled(32, 32, 10));
        let stopper = {
            let p = Arc::clone(&pipeline);
            thread::spawn(move || p.stop())
        };
        let dropped = within(Duration::from_secs(10), move || {
            drop(pipeline);
            stopper.join().is_ok()
        });
        assert_eq!(dropped, Some(true));
    }
}
