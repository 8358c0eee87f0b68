//! Producer/consumer pipeline feeding frames to a [`FaceDetector`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use facecascade_core::{GrayImage, LogObserver};
//! use facecascade_haar::FaceDetector;
//! use facecascade_pipeline::{DetectionPipeline, PipelineParams};
//!
//! let mut detector = FaceDetector::default().with_observer(Arc::new(LogObserver));
//! detector.load_cascade("haarcascade_frontalface_default.xml");
//! let pipeline = DetectionPipeline::new(detector, PipelineParams::default());
//! pipeline.start()?;
//! pipeline.submit_frame(GrayImage::filled(640, 480, 128));
//! let faces = pipeline.current_faces();
//! # Ok::<(), facecascade_pipeline::PipelineError>(())
//! ```
//!
//! [`FaceDetector`]: facecascade_haar::FaceDetector

mod error;
mod params;
mod pipeline;

pub use error::{PipelineConfigError, PipelineError};
pub use params::{PipelineConfig, PipelineParams};
pub use pipeline::{DetectionPipeline, PipelineState, SubmitOutcome};
