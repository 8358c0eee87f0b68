use crate::core::{DetectionWindow, GrayImage, GrayImageView, IntegralImage};
use crate::haar::{FaceDetector, ScanParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidGrayDimensions { width: u32, height: u32 },
}

/// Borrow an `image::GrayImage` as a core frame view.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView::new(img.width() as usize, img.height() as usize, img.as_raw())
}

/// Copy an `image::GrayImage` into an owned core frame, e.g. for
/// [`DetectionPipeline::submit_frame`](crate::DetectionPipeline::submit_frame).
pub fn to_frame(img: &::image::GrayImage) -> GrayImage {
    GrayImage::new(
        img.width() as usize,
        img.height() as usize,
        img.as_raw().clone(),
    )
}

/// Wrap a raw row-major 8-bit buffer, checking its length.
pub fn gray_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::GrayImage, DetectError> {
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidGrayDimensions { width, height });
    }
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(DetectError::InvalidGrayDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h) else {
        return Err(DetectError::InvalidGrayDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(DetectError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::GrayImage::from_raw(width, height, pixels.to_vec())
        .ok_or(DetectError::InvalidGrayDimensions { width, height })
}

/// Run scan and suppression on an image with explicit scan parameters.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(detector, img, params),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn detect_faces_in_image(
    detector: &FaceDetector,
    img: &::image::GrayImage,
    params: &ScanParams,
) -> Vec<DetectionWindow> {
    let view = gray_view(img);
    if !detector.is_loaded() || !view.is_valid() {
        return Vec::new();
    }
    detector.detect_faces_with(&IntegralImage::new(&view), params)
}

pub fn detect_faces_from_gray_u8(
    detector: &FaceDetector,
    width: u32,
    height: u32,
    pixels: &[u8],
    params: &ScanParams,
) -> Result<Vec<DetectionWindow>, DetectError> {
    let img = gray_image_from_slice(width, height, pixels)?;
    Ok(detect_faces_in_image(detector, &img, params))
}

/// Draw the outline of each window into `img`, clipped to the image.
pub fn draw_windows(img: &mut ::image::GrayImage, windows: &[DetectionWindow], value: u8) {
    let (w, h) = img.dimensions();
    for win in windows {
        if win.x >= w || win.y >= h || win.size == 0 {
            continue;
        }
        let right = win.x.saturating_add(win.size - 1).min(w - 1);
        let bottom = win.y.saturating_add(win.size - 1).min(h - 1);
        for x in win.x..=right {
            img.put_pixel(x, win.y, ::image::Luma([value]));
            img.put_pixel(x, bottom, ::image::Luma([value]));
        }
        for y in win.y..=bottom {
            img.put_pixel(win.x, y, ::image::Luma([value]));
            img.put_pixel(right, y, ::image::Luma([value]));
        }
    }
}
