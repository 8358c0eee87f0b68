//! Single-worker detection pipeline.
//!
//! Frame ingestion and result publication use independent locks: the queue
//! lock is held only to push or pop a frame, the result lock only to swap in
//! a finished set. A slow detection pass therefore never blocks producers or
//! readers.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;

use facecascade_core::{DetectionObserver, DetectionWindow, GrayImage};
use facecascade_haar::FaceDetector;
use parking_lot::{Condvar, Mutex, RwLock};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::PipelineError;
use crate::params::PipelineParams;

const WORKER_NAME: &str = "facecascade-worker";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopping,
}

/// What happened to a submitted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Queued,
    /// Queued after evicting the oldest waiting frame.
    QueuedDroppedOldest,
    /// Not queued: detection is disabled or the frame is invalid.
    Ignored,
}

struct Queue {
    frames: VecDeque<GrayImage>,
    state: PipelineState,
    worker: Option<ThreadId>,
}

struct Shared {
    params: PipelineParams,
    queue: Mutex<Queue>,
    wake: Condvar,
    faces: RwLock<Vec<DetectionWindow>>,
    detector: RwLock<FaceDetector>,
    enabled: AtomicBool,
    observer: Arc<dyn DetectionObserver>,
}

/// Bounded drop-oldest frame queue drained by one detection worker.
///
/// State machine: `Idle -> Running -> Stopping -> Idle`. Frames may be
/// submitted in any state; they are only processed while running.
pub struct DetectionPipeline {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DetectionPipeline {
    /// Idle pipeline around `detector`. Pipeline events go to the
    /// detector's observer.
    pub fn new(detector: FaceDetector, params: PipelineParams) -> Self {
        let observer = detector.observer().clone();
        let capacity = params.capacity();
        Self {
            shared: Arc::new(Shared {
                params,
                queue: Mutex::new(Queue {
                    frames: VecDeque::with_capacity(capacity),
                    state: PipelineState::Idle,
                    worker: None,
                }),
                wake: Condvar::new(),
                faces: RwLock::new(Vec::new()),
                detector: RwLock::new(detector),
                enabled: AtomicBool::new(true),
                observer,
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.shared.params
    }

    pub fn state(&self) -> PipelineState {
        self.shared.queue.lock().state
    }

    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().frames.len()
    }

    pub fn is_cascade_loaded(&self) -> bool {
        self.shared.detector.read().is_loaded()
    }

    fn on_worker_thread(&self) -> bool {
        self.shared.queue.lock().worker == Some(thread::current().id())
    }

    /// Spawn the worker. No-op when already running.
    ///
    /// `start` and `stop` from other threads are serialized on the worker
    /// slot, so a concurrent `stop` either completes before the worker is
    /// spawned or stops the worker spawned here.
    pub fn start(&self) -> Result<(), PipelineError> {
        if self.on_worker_thread() {
            return match self.state() {
                PipelineState::Running => Ok(()),
                _ => Err(PipelineError::StartFromWorker),
            };
        }

        let mut slot = self.worker.lock();
        if self.state() == PipelineState::Running {
            return Ok(());
        }
        // Only a worker that stopped itself can leave `Stopping` behind here;
        // it is winding down and is joined before the next one starts.
        if let Some(old) = slot.take() {
            if old.join().is_err() {
                log::error!("detection worker panicked");
            }
        }

        {
            let mut q = self.shared.queue.lock();
            q.state = PipelineState::Running;
            q.worker = None;
        }
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || run_worker(shared));
        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                log::debug!("detection pipeline started");
                Ok(())
            }
            Err(err) => {
                self.shared.queue.lock().state = PipelineState::Idle;
                Err(PipelineError::Spawn(err))
            }
        }
    }

    /// Stop the worker, wait for it to exit and drop queued frames.
    ///
    /// Idempotent. When called from the worker thread itself the worker is
    /// told to exit but not joined.
    pub fn stop(&self) {
        if self.on_worker_thread() {
            self.request_stop();
            return;
        }

        let mut slot = self.worker.lock();
        self.request_stop();
        if let Some(handle) = slot.take() {
            if handle.join().is_err() {
                log::error!("detection worker panicked");
            }
            log::debug!("detection pipeline stopped");
        }
        let mut q = self.shared.queue.lock();
        q.state = PipelineState::Idle;
        q.worker = None;
    }

    fn request_stop(&self) {
        {
            let mut q = self.shared.queue.lock();
            if q.state == PipelineState::Running {
                q.state = PipelineState::Stopping;
            }
            q.frames.clear();
        }
        self.shared.wake.notify_all();
    }

    /// Queue a frame for detection without blocking.
    ///
    /// When the queue is full the oldest frame is evicted first.
    pub fn submit_frame(&self, frame: GrayImage) -> SubmitOutcome {
        if !self.shared.enabled.load(Ordering::Acquire) {
            return SubmitOutcome::Ignored;
        }
        if !frame.is_valid() {
            log::debug!(
                "ignoring invalid {}x{} frame ({} bytes)",
                frame.width,
                frame.height,
                frame.data.len()
            );
            return SubmitOutcome::Ignored;
        }

        let capacity = self.shared.params.capacity();
        let mut dropped = 0usize;
        {
            let mut q = self.shared.queue.lock();
            while q.frames.len() >= capacity {
                q.frames.pop_front();
                dropped += 1;
            }
            q.frames.push_back(frame);
        }
        self.shared.wake.notify_one();

        if dropped == 0 {
            return SubmitOutcome::Queued;
        }
        for _ in 0..dropped {
            self.shared.observer.on_frame_dropped();
        }
        SubmitOutcome::QueuedDroppedOldest
    }

    /// Copy of the last published detection set.
    pub fn current_faces(&self) -> Vec<DetectionWindow> {
        self.shared.faces.read().clone()
    }

    /// Turn detection on or off. Turning it off clears the published set
    /// and any queued frames.
    pub fn enable_face_detection(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::Release);
        if !enabled {
            self.shared.queue.lock().frames.clear();
            self.shared.faces.write().clear();
        }
        log::debug!(
            "face detection {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn is_face_detection_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    /// Replace the cascade from a file.
    ///
    /// The worker is stopped around the swap and restarted if it was
    /// running. The published set is cleared either way. Returns whether the
    /// new cascade is loaded.
    pub fn load_cascade(&self, path: impl AsRef<Path>) -> bool {
        let was_running = self.state() == PipelineState::Running;
        self.stop();
        let loaded = self.shared.detector.write().load_cascade(path);
        self.shared.faces.write().clear();
        if was_running {
            if let Err(err) = self.start() {
                log::error!("{err}");
            }
        }
        loaded
    }
}

impl Drop for DetectionPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(shared: Arc<Shared>) {
    shared.queue.lock().worker = Some(thread::current().id());
    log::debug!("detection worker running");
    let mut last_pass: Option<Instant> = None;
    while let Some(frame) = shared.next_frame(&mut last_pass) {
        shared.process(&frame);
    }
    let mut q = shared.queue.lock();
    q.state = PipelineState::Idle;
    q.worker = None;
    log::debug!("detection worker exiting");
}

impl Shared {
    /// Block until a frame may be processed; `None` once stop is requested.
    fn next_frame(&self, last_pass: &mut Option<Instant>) -> Option<GrayImage> {
        let poll = self.params.poll_interval();
        let min_gap = self.params.min_detection_interval();
        let mut postponed = false;

        let frame = {
            let mut q = self.queue.lock();
            loop {
                if q.state != PipelineState::Running {
                    break None;
                }
                if q.frames.is_empty() {
                    self.wake.wait_for(&mut q, poll);
                    continue;
                }
                let remaining = last_pass
                    .map(|t| min_gap.saturating_sub(t.elapsed()))
                    .filter(|d| !d.is_zero());
                if let Some(remaining) = remaining {
                    postponed = true;
                    self.wake.wait_for(&mut q, remaining.min(poll));
                    continue;
                }
                *last_pass = Some(Instant::now());
                break q.frames.pop_front();
            }
        };

        if postponed {
            self.observer.on_frame_skipped();
        }
        frame
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    fn process(&self, frame: &GrayImage) {
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }
        // Clone out of the lock: observer callbacks run during the scan.
        let detector = self.detector.read().clone();
        let faces = detector.detect_frame(&frame.view());
        let count = faces.len();
        {
            let mut current = self.faces.write();
            if !self.enabled.load(Ordering::Acquire) {
                return;
            }
            *current = faces;
        }
        self.observer.on_published(count);
    }
}
