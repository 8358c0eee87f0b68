//! Viola-Jones Haar cascade detection.
//!
//! - [`Feature`], [`WeakClassifier`], [`Stage`] and [`Cascade`] form the
//!   read-only data model, built once by the [loader](load_cascade_file).
//! - [`scan_cascade`] runs the multi-scale attentional search over an
//!   [`IntegralImage`](facecascade_core::IntegralImage).
//! - [`suppress`] collapses overlapping candidates.
//! - [`FaceDetector`] ties these together behind a single call.
//!
//! ```no_run
//! use facecascade_core::GrayImage;
//! use facecascade_haar::FaceDetector;
//!
//! let mut detector = FaceDetector::default();
//! if detector.load_cascade("haarcascade_frontalface_default.xml") {
//!     let frame = GrayImage::filled(320, 240, 128);
//!     let faces = detector.detect_frame(&frame.view());
//!     println!("{} faces", faces.len());
//! }
//! ```

mod cascade;
mod classifier;
mod detector;
mod feature;
mod io;
mod loader;
mod nms;
mod scan;

pub use cascade::{Cascade, DEFAULT_BASE_SIZE};
pub use classifier::{Stage, WeakClassifier};
pub use detector::FaceDetector;
pub use feature::{Feature, FeatureKind};
pub use io::{DetectorConfig, DetectorConfigError};
pub use loader::{
    load_cascade_file, parse_cascade, CascadeLoadError, CascadeParseError, LoaderParams,
};
pub use nms::{suppress, SuppressionParams};
pub use scan::{scan_cascade, ScanOutput, ScanParams};
