//! Raster file loading and saving.
//!
//! Converts between on-disk raster images (PNG, JPEG, BMP) and the
//! in-memory `RgbPixel` frames the pipeline consumes. Images are
//! flattened to 8-bit RGB on load; alpha, higher bit depths, and exotic
//! color types are converted by the `image` crate's standard paths.

use std::path::Path;

use image::RgbImage;
use rasterflow_pipeline::{Dimensions, RgbPixel};

/// Errors from raster file conversion.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Decoding, encoding, or filesystem failure in the `image` crate.
    #[error("raster file error: {0}")]
    Image(#[from] image::ImageError),

    /// The image's dimensions disagree with what the pipeline was
    /// configured for. Dimension mismatches are rejected here, at the
    /// boundary; they never surface inside the streaming core.
    #[error("image is {actual_width}x{actual_height} but the pipeline expects {expected_width}x{expected_height}")]
    DimensionMismatch {
        /// Width the pipeline expects.
        expected_width: u32,
        /// Height the pipeline expects.
        expected_height: u32,
        /// Width of the supplied image.
        actual_width: u32,
        /// Height of the supplied image.
        actual_height: u32,
    },

    /// A frame buffer's length disagrees with its claimed dimensions.
    #[error("frame holds {actual} pixels but {expected_width}x{expected_height} requires {expected}")]
    FrameSize {
        /// Pixel count the dimensions require.
        expected: u64,
        /// Width claimed for the frame.
        expected_width: u32,
        /// Height claimed for the frame.
        expected_height: u32,
        /// Pixel count actually supplied.
        actual: usize,
    },
}

/// Load a raster file as an RGB frame in raster order.
///
/// # Errors
///
/// Returns [`RasterError::Image`] if the file cannot be read or
/// decoded.
pub fn load_frame(path: &Path) -> Result<(Vec<RgbPixel>, Dimensions), RasterError> {
    let rgb = image::open(path)?.to_rgb8();
    let dims = Dimensions::new(rgb.width(), rgb.height());
    Ok((frame_from_image(&rgb), dims))
}

/// Load a raster file, rejecting it unless it matches `expected`.
///
/// # Errors
///
/// Returns [`RasterError::DimensionMismatch`] if the decoded image's
/// size differs from `expected`, and [`RasterError::Image`] on decode
/// failure.
pub fn load_frame_sized(path: &Path, expected: Dimensions) -> Result<Vec<RgbPixel>, RasterError> {
    let (frame, dims) = load_frame(path)?;
    if dims != expected {
        return Err(RasterError::DimensionMismatch {
            expected_width: expected.width,
            expected_height: expected.height,
            actual_width: dims.width,
            actual_height: dims.height,
        });
    }
    Ok(frame)
}

/// Save an RGB frame to a raster file; the format is inferred from the
/// path extension.
///
/// # Errors
///
/// Returns [`RasterError::FrameSize`] if `frame.len()` disagrees with
/// `dims`, and [`RasterError::Image`] on encode or write failure.
pub fn save_frame(path: &Path, frame: &[RgbPixel], dims: Dimensions) -> Result<(), RasterError> {
    let image = image_from_frame(frame, dims)?;
    image.save(path)?;
    Ok(())
}

/// Flatten a decoded image into a raster-order pixel frame.
#[must_use]
pub fn frame_from_image(image: &RgbImage) -> Vec<RgbPixel> {
    image
        .pixels()
        .map(|p| RgbPixel::new(p.0[0], p.0[1], p.0[2]))
        .collect()
}

/// Rebuild an `RgbImage` from a raster-order pixel frame.
///
/// # Errors
///
/// Returns [`RasterError::FrameSize`] if `frame.len()` is not
/// `width * height`.
pub fn image_from_frame(frame: &[RgbPixel], dims: Dimensions) -> Result<RgbImage, RasterError> {
    if frame.len() as u64 != dims.pixel_count() {
        return Err(RasterError::FrameSize {
            expected: dims.pixel_count(),
            expected_width: dims.width,
            expected_height: dims.height,
            actual: frame.len(),
        });
    }
    let mut raw = Vec::with_capacity(frame.len() * 3);
    for pixel in frame {
        raw.extend_from_slice(&[pixel.r, pixel.g, pixel.b]);
    }
    // Length was validated above; from_raw only fails on a size
    // mismatch.
    RgbImage::from_raw(dims.width, dims.height, raw).ok_or(RasterError::FrameSize {
        expected: dims.pixel_count(),
        expected_width: dims.width,
        expected_height: dims.height,
        actual: frame.len(),
    })
}
