//! Detect faces in an image file and print them as JSON.
//!
//! Usage: detect_image <cascade.xml> <image> [annotated_output.png]

use std::env;

use facecascade::detect::{detect_faces_in_image, draw_windows};
use facecascade::FaceDetector;
use facecascade::core::LogObserver;
use image::ImageReader;
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = env::args().skip(1);
    let (Some(cascade_path), Some(image_path)) = (args.next(), args.next()) else {
        eprintln!("Usage: detect_image <cascade.xml> <image> [annotated_output.png]");
        return Ok(());
    };
    let output_path = args.next();

    let mut detector = FaceDetector::default().with_observer(std::sync::Arc::new(LogObserver));
    if !detector.load_cascade(&cascade_path) {
        return Err(format!("could not load cascade {cascade_path}").into());
    }

    let mut img = ImageReader::open(&image_path)?.decode()?.to_luma8();
    let started = std::time::Instant::now();
    let faces = detect_faces_in_image(&detector, &img, detector.scan_params());
    log::info!(
        "{} faces in {}x{} image ({:.1} ms)",
        faces.len(),
        img.width(),
        img.height(),
        started.elapsed().as_secs_f64() * 1e3
    );
    println!("{}", serde_json::to_string_pretty(&faces)?);

    if let Some(path) = output_path {
        draw_windows(&mut img, &faces, 255);
        img.save(&path)?;
        println!("wrote annotated image to {path}");
    }
    Ok(())
}

fn init_logging() {
    // Ignore errors if a logger/subscriber was already installed.
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}
