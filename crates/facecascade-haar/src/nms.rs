//! Greedy non-maximum suppression of raw scan candidates.

use facecascade_core::DetectionWindow;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionParams {
    /// A window is suppressed when its intersection with an accepted window,
    /// divided by the smaller of the two areas, exceeds this value.
    pub overlap_threshold: f32,
    /// Candidates with a side below this are discarded as noise.
    pub min_window_size: u32,
}

impl Default for SuppressionParams {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.3,
            min_window_size: 30,
        }
    }
}

/// Collapse overlapping candidates, keeping the largest.
///
/// Candidates are ordered by area (descending), then top-to-bottom and
/// left-to-right, so the result does not depend on input order. The output
/// is in that same order.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(candidates, params), fields(candidates = candidates.len()))
)]
pub fn suppress(candidates: &[DetectionWindow], params: &SuppressionParams) -> Vec<DetectionWindow> {
    let mut sorted: Vec<DetectionWindow> = candidates
        .iter()
        .copied()
        .filter(|w| w.size >= params.min_window_size)
        .collect();
    // Equal areas are ordered by position, not input order: the kept set
    // must not depend on the order candidates arrive in.
    sorted.sort_by(|a, b| {
        b.area()
            .cmp(&a.area())
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });

    let mut suppressed = vec![false; sorted.len()];
    let mut kept = Vec::new();
    for i in 0..sorted.len() {
        if suppressed[i] {
            continue;
        }
        let current = sorted[i];
        kept.push(current);
        for j in i + 1..sorted.len() {
            if !suppressed[j] && current.overlap_ratio(&sorted[j]) > params.overlap_threshold {
                suppressed[j] = true;
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(x: u32, y: u32, size: u32) -> DetectionWindow {
        DetectionWindow::new(x, y, size)
    }

    #[test]
    fn overlapping_equal_windows_collapse_to_first() {
        let out = suppress(&[w(10, 10, 50), w(20, 20, 50)], &SuppressionParams::default());
        assert_eq!(out, vec![w(10, 10, 50)]);
    }

    #[test]
    fn small_windows_are_dropped_as_noise() {
        let out = suppress(&[w(0, 0, 29), w(100, 100, 30)], &SuppressionParams::default());
        assert_eq!(out, vec![w(100, 100, 30)]);
    }

    #[test]
    fn contained_window_is_suppressed_by_container() {
        let out = suppress(&[w(40, 40, 32), w(0, 0, 120)], &SuppressionParams::default());
        assert_eq!(out, vec![w(0, 0, 120)]);
    }

    #[test]
    fn low_overlap_keeps_both_in_descending_area() {
        // Intersection 10x40 over min area 1600 = 0.25.
        let out = suppress(&[w(0, 0, 40), w(30, 0, 60)], &SuppressionParams::default());
        assert_eq!(out, vec![w(30, 0, 60), w(0, 0, 40)]);
    }

    #[test]
    fn suppression_is_idempotent() {
        let candidates: Vec<_> = (0..12)
            .map(|i| w(i * 7 % 50, i * 11 % 40, 30 + (i * 13 % 25)))
            .collect();
        let params = SuppressionParams::default();
        let once = suppress(&candidates, &params);
        let twice = suppress(&once, &params);
        assert_eq!(once, twice);
        for (i, a) in once.iter().enumerate() {
            for b in &once[i + 1..] {
                assert!(a.overlap_ratio(b) <= params.overlap_threshold);
            }
        }
    }

    #[test]
    fn suppression_ignores_input_order() {
        let mut candidates = vec![
            w(10, 10, 50),
            w(20, 20, 50),
            w(200, 10, 40),
            w(205, 12, 40),
            w(90, 90, 64),
            w(100, 100, 30),
        ];
        let params = SuppressionParams::default();
        let expected = suppress(&candidates, &params);
        candidates.reverse();
        assert_eq!(suppress(&candidates, &params), expected);
        candidates.rotate_left(2);
        assert_eq!(suppress(&candidates, &params), expected);
    }
}
