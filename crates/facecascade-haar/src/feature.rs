//! Haar-like rectangle features and their evaluation over an integral image.

use facecascade_core::IntegralImage;
use serde::{Deserialize, Serialize};

/// Rectangle pattern of a feature.
///
/// The feature rectangle is split into equal parts along its axis and the
/// part sums are combined with fixed signs (see [`Feature::value`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// left - right
    TwoHorizontal,
    /// top - bottom
    TwoVertical,
    /// left - middle + right
    ThreeHorizontal,
    /// top - middle + bottom
    ThreeVertical,
    /// -top_left + top_right + bottom_left - bottom_right
    FourSquare,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 5] = [
        FeatureKind::TwoHorizontal,
        FeatureKind::TwoVertical,
        FeatureKind::ThreeHorizontal,
        FeatureKind::ThreeVertical,
        FeatureKind::FourSquare,
    ];
}

/// Haar-like feature in base-window coordinates, with its decision parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub kind: FeatureKind,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub threshold: f32,
    pub left_val: f32,
    pub right_val: f32,
    /// `true`: pass when `value * left_val < threshold * right_val`,
    /// `false`: pass when `value * left_val > threshold * right_val`.
    pub polarity: bool,
}

impl Feature {
    /// Feature with default decision parameters (`threshold = 0`,
    /// `left_val = -1`, `right_val = 1`, `polarity = true`).
    pub fn new(kind: FeatureKind, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            kind,
            x,
            y,
            width,
            height,
            threshold: 0.0,
            left_val: -1.0,
            right_val: 1.0,
            polarity: true,
        }
    }

    /// Placeholder feature for a bare feature index.
    ///
    /// `index % 5` picks the kind; the geometry is a fixed shape centred in a
    /// 24x24 window and is not derived from any trained rectangle. Only used
    /// when a cascade file gives an index without a matching rectangle list.
    pub fn canonical(index: usize) -> Self {
        let kind = FeatureKind::ALL[index % FeatureKind::ALL.len()];
        let (x, y, w, h) = match kind {
            FeatureKind::TwoHorizontal => (6, 6, 12, 6),
            FeatureKind::TwoVertical => (6, 6, 6, 12),
            FeatureKind::ThreeHorizontal => (3, 8, 18, 6),
            FeatureKind::ThreeVertical => (8, 3, 6, 18),
            FeatureKind::FourSquare => (6, 6, 12, 12),
        };
        Self::new(kind, x, y, w, h)
    }

    /// Signed feature response for the window at `(x, y)` scaled by `scale`.
    ///
    /// Offsets and sizes are scaled and truncated to whole pixels. Parts that
    /// fall outside the frame contribute only their overlap with it.
    pub fn value(&self, integral: &IntegralImage, x: i32, y: i32, scale: f32) -> f32 {
        // Corner arithmetic stays in i64: a scaled size may saturate to i32::MAX.
        let sx = (x as f32 + self.x as f32 * scale) as i64;
        let sy = (y as f32 + self.y as f32 * scale) as i64;
        let sw = (self.width as f32 * scale) as i64;
        let sh = (self.height as f32 * scale) as i64;

        let sum = |x1: i64, y1: i64, x2: i64, y2: i64| -> i64 {
            integral.rect_sum(to_i32(x1), to_i32(y1), to_i32(x2), to_i32(y2)) as i64
        };

        let right = sx + sw - 1;
        let bottom = sy + sh - 1;

        let v = match self.kind {
            FeatureKind::TwoHorizontal => {
                let half = sw / 2;
                sum(sx, sy, sx + half - 1, bottom) - sum(sx + half, sy, right, bottom)
            }
            FeatureKind::TwoVertical => {
                let half = sh / 2;
                sum(sx, sy, right, sy + half - 1) - sum(sx, sy + half, right, bottom)
            }
            FeatureKind::ThreeHorizontal => {
                let third = sw / 3;
                sum(sx, sy, sx + third - 1, bottom) - sum(sx + third, sy, sx + 2 * third - 1, bottom)
                    + sum(sx + 2 * third, sy, right, bottom)
            }
            FeatureKind::ThreeVertical => {
                let third = sh / 3;
                sum(sx, sy, right, sy + third - 1) - sum(sx, sy + third, right, sy + 2 * third - 1)
                    + sum(sx, sy + 2 * third, right, bottom)
            }
            FeatureKind::FourSquare => {
                let hw = sw / 2;
                let hh = sh / 2;
                let top_left = sum(sx, sy, sx + hw - 1, sy + hh - 1);
                let top_right = sum(sx + hw, sy, right, sy + hh - 1);
                let bottom_left = sum(sx, sy + hh, sx + hw - 1, bottom);
                let bottom_right = sum(sx + hw, sy + hh, right, bottom);
                -top_left + top_right + bottom_left - bottom_right
            }
        };
        v as f32
    }

    /// Weak decision on a feature response.
    ///
    /// The comparison is multiplicative on purpose: leaf values carry the
    /// trained scaling of the threshold.
    #[inline]
    pub fn decide(&self, value: f32) -> bool {
        let lhs = value * self.left_val;
        let rhs = self.threshold * self.right_val;
        if self.polarity {
            lhs < rhs
        } else {
            lhs > rhs
        }
    }
}

// Frame coordinates never reach the i32 limits, so clamping keeps every
// out-of-frame corner out of frame.
#[inline]
fn to_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
