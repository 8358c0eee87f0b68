//! Core types shared by the Haar cascade face detector.
//!
//! This crate is deliberately free of any cascade logic. It owns the frame
//! containers handed over by a capture collaborator, the summed-area table
//! built from each frame, the square detection window, and the observer hook
//! used for counters and logging.

mod image;
mod integral;
mod logger;
mod observer;
mod window;

pub use image::{GrayImage, GrayImageView};
pub use integral::IntegralImage;
pub use window::DetectionWindow;

pub use observer::{
    CountingObserver, DetectionObserver, LogObserver, NoopObserver, ObserverCounts, ScanStats,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, parse_level, LOG_ENV};
