//! Synthetic test patterns for pipeline bring-up.
//!
//! The same patterns the original hardware demo streamed through the
//! RTL: an RGB gradient, a checkerboard, and an edge-detection grid.
//! Each generator produces a raster-order frame for arbitrary
//! dimensions.

use rasterflow_pipeline::{Dimensions, RgbPixel};

/// Default checkerboard square edge, in pixels.
pub const DEFAULT_SQUARE_SIZE: u32 = 32;

/// Default spacing between grid lines in the edge test pattern.
pub const DEFAULT_GRID_SPACING: u32 = 80;

/// Default grid line thickness in the edge test pattern.
pub const DEFAULT_GRID_BAND: u32 = 10;

/// RGB gradient: red rises with the column, green with the row, blue
/// with their sum.
#[must_use]
pub fn gradient(dims: Dimensions) -> Vec<RgbPixel> {
    from_fn(dims, |x, y| {
        let r = (u64::from(x) * 255 / u64::from(dims.width)) as u8;
        let g = (u64::from(y) * 255 / u64::from(dims.height)) as u8;
        let b = ((u64::from(x) + u64::from(y)) * 255 / u64::from(dims.width + dims.height)) as u8;
        RgbPixel::new(r, g, b)
    })
}

/// Black and white checkerboard with squares of `square_size` pixels.
#[must_use]
pub fn checkerboard(dims: Dimensions, square_size: u32) -> Vec<RgbPixel> {
    let square_size = square_size.max(1);
    from_fn(dims, |x, y| {
        if (x / square_size + y / square_size) % 2 == 0 {
            RgbPixel::splat(255)
        } else {
            RgbPixel::splat(0)
        }
    })
}

/// Mid-gray field crossed by white horizontal and black vertical
/// bands — a pattern with strong responses under edge-detection
/// kernels in both axes.
#[must_use]
pub fn edge_grid(dims: Dimensions, spacing: u32, band: u32) -> Vec<RgbPixel> {
    let spacing = spacing.max(1);
    let in_band = move |v: u32| v % spacing < band;
    from_fn(dims, |x, y| {
        // Vertical black bands paint over horizontal white ones.
        if in_band(x) {
            RgbPixel::splat(0)
        } else if in_band(y) {
            RgbPixel::splat(255)
        } else {
            RgbPixel::splat(128)
        }
    })
}

/// Build a frame in raster order from a per-coordinate function.
fn from_fn(dims: Dimensions, f: impl Fn(u32, u32) -> RgbPixel) -> Vec<RgbPixel> {
    let mut frame = Vec::with_capacity(dims.pixel_count() as usize);
    for y in 0..dims.height {
        for x in 0..dims.width {
            frame.push(f(x, y));
        }
    }
    frame
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn gradient_has_expected_extremes() {
        let dims = Dimensions::new(256, 256);
        let frame = gradient(dims);
        assert_eq!(frame.len(), 256 * 256);

        // Top-left corner: everything dark.
        assert_eq!(frame[0], RgbPixel::new(0, 0, 0));
        // Top-right: red near max, green zero.
        let top_right = frame[255];
        assert_eq!(top_right.r, (255u32 * 255 / 256) as u8);
        assert_eq!(top_right.g, 0);
        // Bottom-left: green near max, red zero.
        let bottom_left = frame[255 * 256];
        assert_eq!(bottom_left.r, 0);
        assert_eq!(bottom_left.g, (255u32 * 255 / 256) as u8);
    }

    #[test]
    fn checkerboard_alternates_on_square_boundaries() {
        let dims = Dimensions::new(8, 8);
        let frame = checkerboard(dims, 2);
        let at = |x: usize, y: usize| frame[y * 8 + x];

        assert_eq!(at(0, 0), RgbPixel::splat(255));
        assert_eq!(at(1, 1), RgbPixel::splat(255));
        assert_eq!(at(2, 0), RgbPixel::splat(0));
        assert_eq!(at(0, 2), RgbPixel::splat(0));
        assert_eq!(at(2, 2), RgbPixel::splat(255));
    }

    #[test]
    fn zero_square_size_does_not_divide_by_zero() {
        let frame = checkerboard(Dimensions::new(4, 4), 0);
        assert_eq!(frame.len(), 16);
    }

    #[test]
    fn edge_grid_layers_vertical_over_horizontal() {
        let dims = Dimensions::new(16, 16);
        let frame = edge_grid(dims, 8, 2);
        let at = |x: usize, y: usize| frame[y * 16 + x];

        // (0,0) sits in both a vertical and horizontal band; vertical
        // (black) wins.
        assert_eq!(at(0, 0), RgbPixel::splat(0));
        // Horizontal band away from any vertical band: white.
        assert_eq!(at(4, 1), RgbPixel::splat(255));
        // Open field: gray.
        assert_eq!(at(4, 4), RgbPixel::splat(128));
    }
}
