//! Summed-area table over an 8-bit grayscale frame.
//!
//! Cell `(x, y)` holds the inclusive sum of all intensities in the rectangle
//! `(0, 0)..=(x, y)`, so any axis-aligned rectangle sum costs four lookups.
//! Queries clamp to the table instead of failing: feature rectangles scaled
//! past the frame edge degrade to the part that overlaps the frame.

use crate::GrayImageView;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntegralImage {
    width: usize,
    height: usize,
    data: Vec<u64>,
}

impl IntegralImage {
    /// Build the table for `src`.
    ///
    /// An invalid frame (zero width or height, or a short buffer) produces an
    /// empty table. Callers treat that as "no detection this frame".
    pub fn new(src: &GrayImageView<'_>) -> Self {
        if !src.is_valid() {
            return Self::default();
        }

        let (w, h) = (src.width, src.height);
        let mut data = vec![0u64; w * h];

        let mut acc = 0u64;
        for (cell, &px) in data[..w].iter_mut().zip(src.row(0)) {
            acc += px as u64;
            *cell = acc;
        }

        for y in 1..h {
            let (above, rest) = data.split_at_mut(y * w);
            let above = &above[(y - 1) * w..];
            let mut row_sum = 0u64;
            for ((cell, &up), &px) in rest[..w].iter_mut().zip(above).zip(src.row(y)) {
                row_sum += px as u64;
                *cell = up + row_sum;
            }
        }

        Self {
            width: w,
            height: h,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw table cell, `None` outside the table.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Sum of every pixel in the source frame.
    pub fn total(&self) -> u64 {
        self.data.last().copied().unwrap_or(0)
    }

    /// Inclusive rectangle sum over `(x1, y1)..=(x2, y2)`.
    ///
    /// Both corners are clamped to the table first. A rectangle that is empty
    /// after clamping sums to zero.
    pub fn rect_sum(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let x1 = i64::from(x1).max(0);
        let y1 = i64::from(y1).max(0);
        let x2 = i64::from(x2).min(self.width as i64 - 1);
        let y2 = i64::from(y2).min(self.height as i64 - 1);
        if x2 < x1 || y2 < y1 {
            return 0;
        }

        let d = self.at(x2, y2);
        let b = self.at(x2, y1 - 1);
        let c = self.at(x1 - 1, y2);
        let a = self.at(x1 - 1, y1 - 1);
        (d + a) - (b + c)
    }

    // Corners left of or above the table read as zero.
    #[inline]
    fn at(&self, x: i64, y: i64) -> u64 {
        if x < 0 || y < 0 {
            return 0;
        }
        self.data[y as usize * self.width + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GrayImage;

    fn ramp(w: usize, h: usize) -> GrayImage {
        let data = (0..w * h).map(|i| (i % 251) as u8).collect();
        GrayImage::new(w, h, data)
    }

    fn brute_sum(img: &GrayImage, x1: usize, y1: usize, x2: usize, y2: usize) -> u64 {
        let mut s = 0u64;
        for y in y1..=y2 {
            for x in x1..=x2 {
                s += img.data[y * img.width + x] as u64;
            }
        }
        s
    }

    #[test]
    fn whole_image_query_equals_pixel_total() {
        let img = ramp(37, 23);
        let ii = IntegralImage::new(&img.view());
        let expected: u64 = img.data.iter().map(|&p| p as u64).sum();
        assert_eq!(ii.rect_sum(0, 0, 36, 22), expected);
        assert_eq!(ii.total(), expected);
    }

    #[test]
    fn matches_brute_force_on_inner_rectangles() {
        let img = ramp(16, 12);
        let ii = IntegralImage::new(&img.view());
        for &(x1, y1, x2, y2) in &[(0, 0, 0, 0), (3, 2, 9, 7), (15, 11, 15, 11), (0, 5, 15, 5)] {
            assert_eq!(
                ii.rect_sum(x1 as i32, y1 as i32, x2 as i32, y2 as i32),
                brute_sum(&img, x1, y1, x2, y2),
                "rect ({x1},{y1})-({x2},{y2})"
            );
        }
    }

    #[test]
    fn first_row_and_column_follow_running_sums() {
        let img = GrayImage::from_rows(&[[1u8, 2, 3], [4, 5, 6]]).expect("rows");
        let ii = IntegralImage::new(&img.view());
        assert_eq!(ii.get(0, 0), Some(1));
        assert_eq!(ii.get(2, 0), Some(6));
        assert_eq!(ii.get(0, 1), Some(5));
        assert_eq!(ii.get(2, 1), Some(21));
    }

    #[test]
    fn out_of_bounds_queries_clamp_to_partial_sums() {
        let img = GrayImage::filled(10, 10, 1);
        let ii = IntegralImage::new(&img.view());
        // Rectangle hanging off the bottom-right corner keeps the 3x3 overlap.
        assert_eq!(ii.rect_sum(7, 7, 40, 40), 9);
        // Negative origin keeps the overlap with the top-left corner.
        assert_eq!(ii.rect_sum(-5, -5, 1, 1), 4);
        // Entirely outside: empty after clamping.
        assert_eq!(ii.rect_sum(12, 0, 20, 5), 0);
        assert_eq!(ii.rect_sum(-9, -9, -1, -1), 0);
    }

    #[test]
    fn invalid_frames_build_empty_tables() {
        let empty = GrayImage::default();
        let ii = IntegralImage::new(&empty.view());
        assert!(ii.is_empty());
        assert_eq!(ii.rect_sum(0, 0, 5, 5), 0);

        let short = GrayImageView::new(4, 4, &[1, 2, 3]);
        assert!(IntegralImage::new(&short).is_empty());
    }
}
