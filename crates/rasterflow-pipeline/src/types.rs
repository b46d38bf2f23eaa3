//! Shared types for the rasterflow streaming filter pipeline.

use serde::{Deserialize, Serialize};

/// One unsigned 8-bit sample of a single color channel.
pub type Pixel = u8;

/// A full-color sample: one [`Pixel`] per channel, the unit crossing the
/// pipeline's external interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RgbPixel {
    /// Red sample.
    pub r: u8,
    /// Green sample.
    pub g: u8,
    /// Blue sample.
    pub b: u8,
}

impl RgbPixel {
    /// Create a new pixel from channel samples.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A pixel with the same value in every channel.
    #[must_use]
    pub const fn splat(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// The sample for one channel.
    #[must_use]
    pub const fn channel(self, channel: ChannelId) -> Pixel {
        match channel {
            ChannelId::Red => self.r,
            ChannelId::Green => self.g,
            ChannelId::Blue => self.b,
        }
    }
}

/// Identity of one color lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelId {
    /// Red lane.
    Red,
    /// Green lane.
    Green,
    /// Blue lane.
    Blue,
}

impl ChannelId {
    /// All three lanes, in the order the mixer consumes them.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Lane index in `0..3`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Position of one pixel within a fixed-size frame.
///
/// `col` increments on every transfer and wraps to 0 (incrementing `row`)
/// when the row-end marker is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterCoordinate {
    /// Row, counted from the top of the frame.
    pub row: u32,
    /// Column, counted from the left edge.
    pub col: u32,
}

impl RasterCoordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Frame dimensions in pixels.
///
/// Dimensions are a fixed external parameter of the pipeline; they are
/// never carried in-band on the pixel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions without validation.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Three-bit provenance tag carried alongside each transfer.
///
/// The bits record where in the frame a transfer originated, so that
/// downstream stages never need to count pixels themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RasterTag(u8);

impl RasterTag {
    /// Bit set on the first transfer of a frame.
    pub const START_OF_FRAME: u8 = 0b001;
    /// Bit set on every transfer in column 0.
    pub const FIRST_COLUMN: u8 = 0b010;
    /// Bit set on every transfer in the last row of the frame.
    pub const LAST_ROW: u8 = 0b100;

    /// An empty tag (no provenance bits set).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Tag for the pixel at `coord` in a frame of `dims`.
    #[must_use]
    pub const fn for_coordinate(coord: RasterCoordinate, dims: Dimensions) -> Self {
        let mut bits = 0;
        if coord.row == 0 && coord.col == 0 {
            bits |= Self::START_OF_FRAME;
        }
        if coord.col == 0 {
            bits |= Self::FIRST_COLUMN;
        }
        if coord.row + 1 == dims.height {
            bits |= Self::LAST_ROW;
        }
        Self(bits)
    }

    /// Raw three-bit value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether this transfer is the first of its frame.
    #[must_use]
    pub const fn is_start_of_frame(self) -> bool {
        self.0 & Self::START_OF_FRAME != 0
    }

    /// Whether this transfer sits in column 0.
    #[must_use]
    pub const fn is_first_column(self) -> bool {
        self.0 & Self::FIRST_COLUMN != 0
    }

    /// Whether this transfer sits in the last row of its frame.
    #[must_use]
    pub const fn is_last_row(self) -> bool {
        self.0 & Self::LAST_ROW != 0
    }
}

/// The atomic unit crossing a flow channel: a payload plus the row-end
/// marker and provenance tag.
///
/// A transfer is *committed* only in a tick where the source holds it
/// valid and the sink is ready; until then the source must keep it
/// bit-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer<T> {
    /// Stage payload (pixel, window, or filter result).
    pub payload: T,
    /// Set on the last transfer of each row.
    pub end_of_row: bool,
    /// Row/column provenance bits.
    pub tag: RasterTag,
}

impl<T> Transfer<T> {
    /// Create a new transfer.
    pub const fn new(payload: T, end_of_row: bool, tag: RasterTag) -> Self {
        Self {
            payload,
            end_of_row,
            tag,
        }
    }

    /// Whether this transfer ends its frame (row end in the last row).
    #[must_use]
    pub const fn is_end_of_frame(&self) -> bool {
        self.end_of_row && self.tag.is_last_row()
    }

    /// Rebuild the transfer with a different payload, keeping the marker
    /// and tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Transfer<U> {
        Transfer {
            payload: f(self.payload),
            end_of_row: self.end_of_row,
            tag: self.tag,
        }
    }
}

/// The 3×3 neighborhood of samples centered on one output pixel.
///
/// Samples are stored row-major, top row first; positions outside the
/// frame hold zero. A window is never partially populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window3x3 {
    /// Neighborhood samples, `samples[dy + 1][dx + 1]` for
    /// `(dy, dx)` in `{-1, 0, 1}²`.
    pub samples: [[Pixel; 3]; 3],
    /// Frame coordinate of the center sample.
    pub center: RasterCoordinate,
}

impl Window3x3 {
    /// Create a window from its samples and center coordinate.
    #[must_use]
    pub const fn new(samples: [[Pixel; 3]; 3], center: RasterCoordinate) -> Self {
        Self { samples, center }
    }

    /// The sample at offset `(dy, dx)` from the center, each in `-1..=1`.
    #[must_use]
    pub fn sample(&self, dy: i32, dx: i32) -> Pixel {
        debug_assert!((-1..=1).contains(&dy) && (-1..=1).contains(&dx));
        self.samples[(dy + 1).unsigned_abs() as usize][(dx + 1).unsigned_abs() as usize]
    }

    /// The center sample.
    #[must_use]
    pub const fn center_sample(&self) -> Pixel {
        self.samples[1][1]
    }
}

/// One spatial-filter output scalar, tagged with the coordinate it was
/// computed for so the mixer can verify lane alignment.
///
/// The accumulator is exact: nine products of an unsigned 8-bit sample
/// and a signed 8-bit coefficient sum to at most `9 * 255 * 127` in
/// magnitude, well inside `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterResult {
    /// Signed accumulator value, optionally floor-clamped.
    pub value: i32,
    /// Coordinate of the window center this scalar was computed from.
    pub coord: RasterCoordinate,
}

/// Errors surfaced by pipeline construction and the frame driver.
///
/// The streaming core itself has no recoverable runtime errors: it is a
/// total function of its inputs and configuration, modulo stalls.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Frame dimensions with a zero extent were supplied.
    #[error("invalid frame dimensions {width}x{height}: both extents must be nonzero")]
    InvalidDimensions {
        /// Rejected width.
        width: u32,
        /// Rejected height.
        height: u32,
    },

    /// The frame driver was handed a pixel slice whose length disagrees
    /// with the configured dimensions.
    #[error("frame has {actual} pixels but the pipeline is configured for {expected}")]
    FrameSizeMismatch {
        /// Pixel count the configured dimensions require.
        expected: u64,
        /// Pixel count actually supplied.
        actual: usize,
    },

    /// The frame driver observed no transfer progress within its tick
    /// budget. The streaming core never times out on its own; this bound
    /// belongs to the enclosing harness.
    #[error("pipeline made no progress for {idle_ticks} ticks (deadlock)")]
    Stalled {
        /// Consecutive ticks without a committed transfer.
        idle_ticks: u64,
    },
}
