use std::path::Path;
use std::sync::Arc;

use facecascade_core::{
    DetectionObserver, DetectionWindow, GrayImageView, IntegralImage, LogObserver,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::cascade::Cascade;
use crate::loader::{load_cascade_file, LoaderParams};
use crate::nms::{suppress, SuppressionParams};
use crate::scan::{scan_cascade, ScanOutput, ScanParams};

/// Cascade plus the parameters of scanning and suppression.
///
/// The cascade is shared behind an [`Arc`] and only ever replaced as a whole,
/// so clones of a detector are cheap and never observe a half-built cascade.
#[derive(Clone)]
pub struct FaceDetector {
    cascade: Arc<Cascade>,
    scan: ScanParams,
    suppression: SuppressionParams,
    loader: LoaderParams,
    observer: Arc<dyn DetectionObserver>,
}

impl Default for FaceDetector {
    fn default() -> Self {
        Self::new(Cascade::default())
    }
}

impl std::fmt::Debug for FaceDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceDetector")
            .field("stages", &self.cascade.stages().len())
            .field("loaded", &self.cascade.is_loaded())
            .field("scan", &self.scan)
            .field("suppression", &self.suppression)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl FaceDetector {
    pub fn new(cascade: Cascade) -> Self {
        Self {
            cascade: Arc::new(cascade),
            scan: ScanParams::default(),
            suppression: SuppressionParams::default(),
            loader: LoaderParams::default(),
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_scan_params(mut self, scan: ScanParams) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_suppression_params(mut self, suppression: SuppressionParams) -> Self {
        self.suppression = suppression;
        self
    }

    pub fn with_loader_params(mut self, loader: LoaderParams) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DetectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[inline]
    pub fn cascade(&self) -> &Arc<Cascade> {
        &self.cascade
    }

    #[inline]
    pub fn scan_params(&self) -> &ScanParams {
        &self.scan
    }

    #[inline]
    pub fn suppression_params(&self) -> &SuppressionParams {
        &self.suppression
    }

    #[inline]
    pub fn loader_params(&self) -> &LoaderParams {
        &self.loader
    }

    #[inline]
    pub fn observer(&self) -> &Arc<dyn DetectionObserver> {
        &self.observer
    }

    pub fn is_loaded(&self) -> bool {
        self.cascade.is_loaded()
    }

    /// Replace the cascade as a whole.
    pub fn set_cascade(&mut self, cascade: impl Into<Arc<Cascade>>) {
        self.cascade = cascade.into();
    }

    /// Load a cascade file, replacing the current cascade.
    ///
    /// On failure the detector is left holding an unloaded cascade and
    /// `false` is returned; the reason goes to the observer and the log.
    pub fn load_cascade(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match load_cascade_file(path, &self.loader) {
            Ok(cascade) => {
                self.observer
                    .on_cascade_loaded(cascade.stages().len(), cascade.classifier_count());
                self.cascade = Arc::new(cascade);
                true
            }
            Err(err) => {
                let reason = format!("{}: {err}", path.display());
                self.observer.on_cascade_rejected(&reason);
                self.cascade = Arc::new(Cascade::default());
                false
            }
        }
    }

    /// Raw scan candidates and statistics, before suppression.
    pub fn scan_raw(&self, integral: &IntegralImage, params: &ScanParams) -> ScanOutput {
        let out = scan_cascade(&self.cascade, integral, params);
        self.observer.on_scan(&out.stats);
        out
    }

    /// Detect with the detector's own scan parameters.
    pub fn detect_faces(&self, integral: &IntegralImage) -> Vec<DetectionWindow> {
        self.detect_faces_with(integral, &self.scan)
    }

    /// Scan then suppress. Empty when the cascade is not loaded.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, integral, params))
    )]
    pub fn detect_faces_with(
        &self,
        integral: &IntegralImage,
        params: &ScanParams,
    ) -> Vec<DetectionWindow> {
        if !self.cascade.is_loaded() {
            log::trace!("detection refused: cascade not loaded");
            return Vec::new();
        }
        let raw = self.scan_raw(integral, params);
        let faces = suppress(&raw.windows, &self.suppression);
        self.observer.on_suppression(raw.windows.len(), faces.len());
        faces
    }

    /// Build the integral image of `frame` and detect on it.
    ///
    /// Invalid frames (zero size, short buffer) give no detections.
    pub fn detect_frame(&self, frame: &GrayImageView<'_>) -> Vec<DetectionWindow> {
        if !self.cascade.is_loaded() || !frame.is_valid() {
            return Vec::new();
        }
        self.detect_faces(&IntegralImage::new(frame))
    }
}
