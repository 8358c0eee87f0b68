//! High-level facade crate for the `facecascade-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the underlying crates,
//! - (feature-gated) helpers that run a [`FaceDetector`] on an
//!   `image::GrayImage` or a raw 8-bit buffer,
//! - (feature `tracing`) a subscriber setup that also captures `log` records.
//!
//! ## Quickstart
//!
//! ```no_run
//! use facecascade::detect;
//! use facecascade::{FaceDetector, ScanParams};
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("people.png")?.decode()?.to_luma8();
//! let mut detector = FaceDetector::default();
//! if !detector.load_cascade("haarcascade_frontalface_default.xml") {
//!     return Err("cascade not loaded".into());
//! }
//! let faces = detect::detect_faces_in_image(&detector, &img, &ScanParams::default());
//! println!("{} faces", faces.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `facecascade::core`: frames, integral image, windows, observers, logger.
//! - `facecascade::haar`: cascade model and loader, scan, suppression.
//! - `facecascade::pipeline`: producer/consumer detection pipeline.
//! - `facecascade::detect` (feature `image`): helpers from `image::GrayImage`.

pub use facecascade_core as core;
pub use facecascade_haar as haar;
pub use facecascade_pipeline as pipeline;

pub use facecascade_core::{DetectionObserver, DetectionWindow, GrayImage, IntegralImage};
pub use facecascade_haar::{Cascade, DetectorConfig, FaceDetector, ScanParams, SuppressionParams};
pub use facecascade_pipeline::{DetectionPipeline, PipelineConfig, PipelineParams};

#[cfg(feature = "image")]
pub mod detect;

/// Install a `tracing` subscriber filtered by `RUST_LOG` and route `log`
/// records through it.
///
/// Errors from an already installed logger or subscriber are ignored.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let _ = tracing_log::LogTracer::init();
    facecascade_core::init_tracing(json);
}
