use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use facecascade_core::DetectionObserver;
use facecascade_haar::DetectorConfig;
use serde::{Deserialize, Serialize};

use crate::error::PipelineConfigError;
use crate::pipeline::DetectionPipeline;

/// Queue and timing settings of a [`DetectionPipeline`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Frames held before the oldest is evicted. Zero is treated as one.
    pub queue_capacity: usize,
    /// Longest the worker sleeps before re-checking for stop requests.
    pub poll_interval_ms: u64,
    /// Minimum time between the starts of two detection passes.
    pub min_detection_interval_ms: u64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            queue_capacity: 5,
            poll_interval_ms: 100,
            min_detection_interval_ms: 66,
        }
    }
}

impl PipelineParams {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    #[inline]
    pub fn min_detection_interval(&self) -> Duration {
        Duration::from_millis(self.min_detection_interval_ms)
    }
}

/// Detector and pipeline settings in one JSON document.
///
/// Detector fields sit at the top level, pipeline fields under `"pipeline"`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(flatten)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub pipeline: PipelineParams,
}

impl PipelineConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PipelineConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PipelineConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build an idle pipeline; the cascade is loaded if a path is set.
    pub fn build_pipeline(&self, observer: Arc<dyn DetectionObserver>) -> DetectionPipeline {
        DetectionPipeline::new(
            self.detector.build_detector(observer),
            self.pipeline.clone(),
        )
    }
}
