use serde::{Deserialize, Serialize};

/// Square detection window in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionWindow {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl DetectionWindow {
    pub fn new(x: u32, y: u32, size: u32) -> Self {
        Self { x, y, size }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.size) * u64::from(self.size)
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.size)
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.size)
    }

    pub fn intersection_area(&self, other: &DetectionWindow) -> u64 {
        let x1 = u64::from(self.x.max(other.x));
        let y1 = u64::from(self.y.max(other.y));
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return 0;
        }
        (x2 - x1) * (y2 - y1)
    }

    /// Intersection divided by the smaller of the two areas.
    ///
    /// A window fully contained in another scores 1.0 regardless of how much
    /// larger the container is.
    pub fn overlap_ratio(&self, other: &DetectionWindow) -> f32 {
        let min_area = self.area().min(other.area());
        if min_area == 0 {
            return 0.0;
        }
        self.intersection_area(other) as f32 / min_area as f32
    }
}
