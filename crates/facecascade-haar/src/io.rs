//! JSON configuration for a face detector.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use facecascade_core::DetectionObserver;
use serde::{Deserialize, Serialize};

use crate::detector::FaceDetector;
use crate::loader::LoaderParams;
use crate::nms::SuppressionParams;
use crate::scan::ScanParams;

#[derive(thiserror::Error, Debug)]
pub enum DetectorConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Detector settings as stored on disk.
///
/// Every section is optional in JSON and falls back to its defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Cascade file to load when building a detector.
    pub cascade_path: Option<PathBuf>,
    pub scan: ScanParams,
    pub suppression: SuppressionParams,
    pub loader: LoaderParams,
}

impl DetectorConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectorConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectorConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a detector and, if a cascade path is set, load it.
    ///
    /// A cascade that fails to load leaves the detector unloaded; check
    /// [`FaceDetector::is_loaded`].
    pub fn build_detector(&self, observer: Arc<dyn DetectionObserver>) -> FaceDetector {
        let mut detector = FaceDetector::default()
            .with_scan_params(self.scan.clone())
            .with_suppression_params(self.suppression.clone())
            .with_loader_params(self.loader.clone())
            .with_observer(observer);
        if let Some(path) = &self.cascade_path {
            detector.load_cascade(path);
        }
        detector
    }
}
