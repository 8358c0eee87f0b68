//! Injectable observability hook.
//!
//! Detectors and pipelines report what they did through a
//! [`DetectionObserver`] handed to them at construction. Every method has a
//! no-op default so implementors only override what they care about.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Per-pass statistics produced by a multi-scale scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Number of window sizes visited.
    pub scales: usize,
    /// Number of window positions evaluated across all scales.
    pub windows: usize,
    /// Windows that passed every stage.
    pub candidates: usize,
    /// `rejected_at_stage[i]` counts windows whose first failing stage was `i`.
    pub rejected_at_stage: Vec<usize>,
}

impl ScanStats {
    pub fn with_stages(stages: usize) -> Self {
        Self {
            rejected_at_stage: vec![0; stages],
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: &ScanStats) {
        self.scales += other.scales;
        self.windows += other.windows;
        self.candidates += other.candidates;
        if self.rejected_at_stage.len() < other.rejected_at_stage.len() {
            self.rejected_at_stage
                .resize(other.rejected_at_stage.len(), 0);
        }
        for (dst, src) in self
            .rejected_at_stage
            .iter_mut()
            .zip(&other.rejected_at_stage)
        {
            *dst += *src;
        }
    }
}

pub trait DetectionObserver: Send + Sync {
    fn on_scan(&self, _stats: &ScanStats) {}
    fn on_suppression(&self, _before: usize, _after: usize) {}
    /// A queued frame was evicted to make room for a newer one.
    fn on_frame_dropped(&self) {}
    /// A detection pass was postponed by the rate limiter.
    fn on_frame_skipped(&self) {}
    fn on_published(&self, _count: usize) {}
    fn on_cascade_loaded(&self, _stages: usize, _classifiers: usize) {}
    fn on_cascade_rejected(&self, _reason: &str) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl DetectionObserver for NoopObserver {}

/// Observer that forwards events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl DetectionObserver for LogObserver {
    fn on_scan(&self, stats: &ScanStats) {
        log::debug!(
            "scan: {} scales, {} windows, {} candidates, rejections per stage {:?}",
            stats.scales,
            stats.windows,
            stats.candidates,
            stats.rejected_at_stage
        );
    }

    fn on_suppression(&self, before: usize, after: usize) {
        log::debug!("non-maximum suppression: {before} -> {after} windows");
    }

    fn on_frame_dropped(&self) {
        log::trace!("frame queue full, dropped oldest frame");
    }

    fn on_frame_skipped(&self) {
        log::trace!("detection pass postponed by rate limiter");
    }

    fn on_published(&self, count: usize) {
        log::debug!("published {count} detections");
    }

    fn on_cascade_loaded(&self, stages: usize, classifiers: usize) {
        log::info!("cascade loaded: {stages} stages, {classifiers} weak classifiers");
    }

    fn on_cascade_rejected(&self, reason: &str) {
        log::warn!("cascade not loaded: {reason}");
    }
}

/// Plain snapshot of [`CountingObserver`] counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverCounts {
    pub scans: u64,
    pub windows: u64,
    pub candidates: u64,
    pub suppressed: u64,
    pub frames_dropped: u64,
    pub frames_skipped: u64,
    pub published: u64,
    pub cascades_loaded: u64,
    pub cascades_rejected: u64,
}

/// Observer aggregating counters in atomics.
#[derive(Debug, Default)]
pub struct CountingObserver {
    scans: AtomicU64,
    windows: AtomicU64,
    candidates: AtomicU64,
    suppressed: AtomicU64,
    frames_dropped: AtomicU64,
    frames_skipped: AtomicU64,
    published: AtomicU64,
    cascades_loaded: AtomicU64,
    cascades_rejected: AtomicU64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ObserverCounts {
        ObserverCounts {
            scans: self.scans.load(Ordering::Relaxed),
            windows: self.windows.load(Ordering::Relaxed),
            candidates: self.candidates.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            cascades_loaded: self.cascades_loaded.load(Ordering::Relaxed),
            cascades_rejected: self.cascades_rejected.load(Ordering::Relaxed),
        }
    }
}

impl DetectionObserver for CountingObserver {
    fn on_scan(&self, stats: &ScanStats) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.windows
            .fetch_add(stats.windows as u64, Ordering::Relaxed);
        self.candidates
            .fetch_add(stats.candidates as u64, Ordering::Relaxed);
    }

    fn on_suppression(&self, before: usize, after: usize) {
        self.suppressed
            .fetch_add(before.saturating_sub(after) as u64, Ordering::Relaxed);
    }

    fn on_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn on_frame_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn on_published(&self, _count: usize) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    fn on_cascade_loaded(&self, _stages: usize, _classifiers: usize) {
        self.cascades_loaded.fetch_add(1, Ordering::Relaxed);
    }

    fn on_cascade_rejected(&self, _reason: &str) {
        self.cascades_rejected.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_and_widens_stage_histogram() {
        let mut a = ScanStats::with_stages(2);
        a.windows = 10;
        a.rejected_at_stage = vec![7, 1];
        let b = ScanStats {
            scales: 1,
            windows: 5,
            candidates: 1,
            rejected_at_stage: vec![2, 1, 1],
        };
        a.merge(&b);
        assert_eq!(a.windows, 15);
        assert_eq!(a.candidates, 1);
        assert_eq!(a.rejected_at_stage, vec![9, 2, 1]);
    }

    #[test]
    fn counting_observer_accumulates() {
        let obs = CountingObserver::new();
        obs.on_scan(&ScanStats {
            scales: 2,
            windows: 40,
            candidates: 3,
            rejected_at_stage: vec![37],
        });
        obs.on_suppression(3, 1);
        obs.on_frame_dropped();
        obs.on_frame_dropped();
        let counts = obs.snapshot();
        assert_eq!(counts.scans, 1);
        assert_eq!(counts.windows, 40);
        assert_eq!(counts.suppressed, 2);
        assert_eq!(counts.frames_dropped, 2);
    }
}
