//! Sliding 3×3 window construction over a row-major pixel stream.
//!
//! One [`WindowBuilder`] serves one color lane. It buffers the three
//! most recent rows in a ring indexed mod 3 and emits, for every pixel
//! of the frame, the 3×3 neighborhood centered on that pixel, with
//! positions outside the frame reading as zero.
//!
//! # Emission order and timing
//!
//! Windows are emitted in raster order of their centers. A window
//! centered at `(r, c)` becomes emittable once every in-bounds pixel at
//! `(r', c')` with `r' <= r + 1` and `c' <= c + 1` has arrived — with
//! row-major arrival, that is the moment pixel
//! `(min(r + 1, h - 1), min(c + 1, w - 1))` is accepted. Interior
//! arrivals therefore release exactly one window (lagging one row and
//! one column behind the input); row-end and last-row arrivals release
//! short bursts, up to `width + 2` windows on the final pixel of the
//! frame. Bursts queue in a bounded pending buffer and the builder
//! refuses further input until the queue drains, so a stalled consumer
//! can never cause a buffered row to be overwritten mid-use.
//!
//! Over a complete frame the number of windows emitted equals the
//! number of pixels accepted.

use std::collections::VecDeque;

use crate::flow::FlowChannel;
use crate::types::{Dimensions, Pixel, RasterCoordinate, RasterTag, Transfer, Window3x3};

/// Per-lane streaming state, mirrored at the pipeline's top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanePhase {
    /// No pixel of the current frame has been accepted yet.
    Idle,
    /// Buffering initial rows; nothing emitted yet.
    Filling,
    /// Steady state: one window out per pixel in.
    Streaming,
}

/// Builds zero-padded 3×3 windows from a per-channel pixel stream.
#[derive(Debug)]
pub struct WindowBuilder {
    dims: Dimensions,
    /// Ring of the three most recent rows, indexed by `row % 3`.
    rows: [Vec<Pixel>; 3],
    /// Coordinate the next accepted pixel will be written to.
    cursor: RasterCoordinate,
    /// Center of the next window to emit, in raster order.
    next_center: RasterCoordinate,
    /// Coordinate of the most recently accepted pixel of this frame.
    accepted: Option<RasterCoordinate>,
    /// Windows enabled but not yet offered downstream.
    pending: VecDeque<Transfer<Window3x3>>,
    /// Set once the frame's final window has been enqueued.
    frame_done: bool,
    phase: LanePhase,
}

impl WindowBuilder {
    /// Create a builder for frames of the given dimensions.
    ///
    /// Dimensions are validated by the pipeline constructor; both
    /// extents are nonzero by the time a builder is made.
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        let width = dims.width as usize;
        Self {
            dims,
            rows: std::array::from_fn(|_| vec![0; width]),
            cursor: RasterCoordinate::new(0, 0),
            next_center: RasterCoordinate::new(0, 0),
            accepted: None,
            pending: VecDeque::new(),
            frame_done: false,
            phase: LanePhase::Idle,
        }
    }

    /// Current per-lane phase.
    #[must_use]
    pub const fn phase(&self) -> LanePhase {
        self.phase
    }

    /// Whether the builder would consume an offered pixel this tick.
    ///
    /// False while enabled windows are still queued: accepting more
    /// input before the queue drains is what would let a stalled
    /// downstream overwrite buffered rows.
    #[must_use]
    pub fn can_consume(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance this stage by one tick: move at most one queued window
    /// into `output` and consume at most one pixel from `input`.
    pub fn step(&mut self, input: &mut FlowChannel<Pixel>, output: &mut FlowChannel<Window3x3>) {
        self.drain_one(output);

        if self.frame_done && self.pending.is_empty() {
            self.frame_done = false;
            self.phase = LanePhase::Idle;
        }

        if self.pending.is_empty() {
            if let Some(transfer) = input.take() {
                self.accept(transfer);
                // A window enabled by this pixel may leave immediately
                // if the output slot is still free.
                self.drain_one(output);
            }
        }
    }

    /// Offer the oldest queued window downstream, if any and if the
    /// output slot is free.
    fn drain_one(&mut self, output: &mut FlowChannel<Window3x3>) {
        if !output.can_accept() {
            return;
        }
        if let Some(window) = self.pending.pop_front() {
            let offered = output.offer(window);
            debug_assert!(offered);
            self.phase = LanePhase::Streaming;
        }
    }

    /// Store one pixel and enqueue every window it enables.
    fn accept(&mut self, transfer: Transfer<Pixel>) {
        let coord = self.cursor;
        debug_assert_eq!(
            transfer.end_of_row,
            coord.col + 1 == self.dims.width,
            "row-end marker disagrees with configured width",
        );

        self.rows[(coord.row % 3) as usize][coord.col as usize] = transfer.payload;
        self.accepted = Some(coord);
        if self.phase == LanePhase::Idle {
            self.phase = LanePhase::Filling;
        }

        while !self.frame_done && self.is_emittable(self.next_center) {
            let window = self.materialize(self.next_center);
            self.pending.push_back(window);

            if self.next_center.row + 1 == self.dims.height
                && self.next_center.col + 1 == self.dims.width
            {
                self.frame_done = true;
                self.accepted = None;
            } else if self.next_center.col + 1 == self.dims.width {
                self.next_center = RasterCoordinate::new(self.next_center.row + 1, 0);
            } else {
                self.next_center.col += 1;
            }
        }

        // Advance the write cursor, wrapping on the row-end marker.
        if transfer.end_of_row {
            if coord.row + 1 == self.dims.height {
                self.cursor = RasterCoordinate::new(0, 0);
                self.next_center = RasterCoordinate::new(0, 0);
            } else {
                self.cursor = RasterCoordinate::new(coord.row + 1, 0);
            }
        } else {
            self.cursor = RasterCoordinate::new(coord.row, coord.col + 1);
        }
    }

    /// Whether every in-bounds neighbor of `center`'s window (and the
    /// center itself) has arrived.
    fn is_emittable(&self, center: RasterCoordinate) -> bool {
        let Some(accepted) = self.accepted else {
            return false;
        };
        let need_row = (center.row + 1).min(self.dims.height - 1);
        let need_col = (center.col + 1).min(self.dims.width - 1);
        need_row < accepted.row || (need_row == accepted.row && need_col <= accepted.col)
    }

    /// Copy the neighborhood of `center` out of the row ring, zero
    /// outside the frame.
    fn materialize(&self, center: RasterCoordinate) -> Transfer<Window3x3> {
        let mut samples = [[0u8; 3]; 3];
        for (wy, window_row) in samples.iter_mut().enumerate() {
            for (wx, sample) in window_row.iter_mut().enumerate() {
                let row = i64::from(center.row) + wy as i64 - 1;
                let col = i64::from(center.col) + wx as i64 - 1;
                let in_bounds = row >= 0
                    && row < i64::from(self.dims.height)
                    && col >= 0
                    && col < i64::from(self.dims.width);
                if in_bounds {
                    *sample = self.rows[(row % 3) as usize][col as usize];
                }
            }
        }

        Transfer::new(
            Window3x3::new(samples, center),
            center.col + 1 == self.dims.width,
            RasterTag::for_coordinate(center, self.dims),
        )
    }
}
