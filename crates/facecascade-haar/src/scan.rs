//! Multi-scale sliding-window search over an integral image.

use facecascade_core::{DetectionWindow, IntegralImage, ScanStats};
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::cascade::Cascade;

/// Window-size range and sampling of the multi-scale search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Smallest window side in pixels.
    pub min_size: u32,
    /// Largest window side in pixels, clamped to the frame's smaller side.
    pub max_size: u32,
    /// Multiplicative step between window sizes, must be > 1.
    pub scale_factor: f32,
    /// Pixel stride between window positions.
    pub step: u32,
    /// Replacement for `min_size` when it exceeds the clamped `max_size`.
    pub fallback_min_size: u32,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            min_size: 24,
            max_size: 400,
            scale_factor: 1.25,
            step: 3,
            fallback_min_size: 20,
        }
    }
}

impl ScanParams {
    pub fn with_sizes(min_size: u32, max_size: u32, scale_factor: f32) -> Self {
        Self {
            min_size,
            max_size,
            scale_factor,
            ..Self::default()
        }
    }

    /// Window sides visited for a `width` x `height` frame, ascending.
    ///
    /// Degenerate values are repaired rather than rejected: `max_size` is
    /// clamped to the frame, a `min_size` above it falls back to
    /// `fallback_min_size`, a non-increasing `scale_factor` uses the default,
    /// and every step advances by at least one pixel.
    pub fn window_sizes(&self, width: u32, height: u32) -> Vec<u32> {
        let mut max_size = self.max_size;
        if max_size > width || max_size > height {
            max_size = width.min(height);
            log::debug!("max window size clamped to {max_size}");
        }
        let mut min_size = self.min_size.max(1);
        if min_size > max_size {
            min_size = self.fallback_min_size.max(1);
            log::debug!("min window size reset to {min_size}");
        }
        let factor = if self.scale_factor.is_finite() && self.scale_factor > 1.0 {
            self.scale_factor
        } else {
            log::warn!(
                "scale factor {} is not > 1, using {}",
                self.scale_factor,
                ScanParams::default().scale_factor
            );
            ScanParams::default().scale_factor
        };

        let mut sizes = Vec::new();
        let mut size = min_size;
        while size <= max_size {
            sizes.push(size);
            let next = (size as f32 * factor) as u32;
            size = next.max(size + 1);
        }
        sizes
    }
}

/// Raw scan result, before suppression.
#[derive(Clone, Debug, Default)]
pub struct ScanOutput {
    pub windows: Vec<DetectionWindow>,
    pub stats: ScanStats,
}

/// Evaluate the cascade at every window size and position.
///
/// A window is accepted only if it passes every stage, in order; evaluation
/// of a window stops at its first failing stage. An unloaded cascade or an
/// empty integral image yields an empty result without scanning.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(cascade, integral, params),
        fields(width = integral.width(), height = integral.height(), stages = cascade.stages().len())
    )
)]
pub fn scan_cascade(cascade: &Cascade, integral: &IntegralImage, params: &ScanParams) -> ScanOutput {
    let mut out = ScanOutput {
        windows: Vec::new(),
        stats: ScanStats::with_stages(cascade.stages().len()),
    };
    if !cascade.is_loaded() || integral.is_empty() {
        return out;
    }

    let width = integral.width() as u32;
    let height = integral.height() as u32;
    let step = params.step.max(1) as usize;

    for size in params.window_sizes(width, height) {
        let scale = size as f32 / cascade.base_width() as f32;
        let rows: Vec<u32> = (0..=height - size).step_by(step).collect();
        out.stats.scales += 1;

        #[cfg(feature = "rayon")]
        let per_row: Vec<ScanOutput> = rows
            .par_iter()
            .map(|&y| scan_row(cascade, integral, y, size, scale, width, step))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let per_row: Vec<ScanOutput> = rows
            .iter()
            .map(|&y| scan_row(cascade, integral, y, size, scale, width, step))
            .collect();

        for row in per_row {
            out.windows.extend(row.windows);
            out.stats.merge(&row.stats);
        }
    }

    out.stats.candidates = out.windows.len();
    out
}

fn scan_row(
    cascade: &Cascade,
    integral: &IntegralImage,
    y: u32,
    size: u32,
    scale: f32,
    width: u32,
    step: usize,
) -> ScanOutput {
    let mut row = ScanOutput {
        windows: Vec::new(),
        stats: ScanStats::with_stages(cascade.stages().len()),
    };
    for x in (0..=width - size).step_by(step) {
        row.stats.windows += 1;
        match cascade.first_rejecting_stage(integral, x as i32, y as i32, scale) {
            Some(stage) => row.stats.rejected_at_stage[stage] += 1,
            None => row.windows.push(DetectionWindow::new(x, y, size)),
        }
    }
    row
}
