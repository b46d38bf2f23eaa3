//! The pipeline orchestrator: three color lanes behind one external
//! input and one external output.
//!
//! The orchestrator fans each RGB input transfer out into three
//! per-channel transfers with identical row markers and tags, gates the
//! external input's `ready` on *all three* lanes being ready (no lane
//! may silently fall behind), and joins the lanes back through the
//! [`ChannelMixer`] into the external output.
//!
//! # Clocking
//!
//! [`FilterPipeline::tick`] advances the whole pipeline by one
//! synchronous time-step, sweeping stages sink-to-source. Every
//! inter-stage [`FlowChannel`] is a one-slot register, so the sweep is
//! observably equivalent to a single global synchronous update: a
//! stage's commit in tick N is visible to its neighbor no earlier than
//! tick N. The external producer and consumer interact with the
//! channel endpoints between ticks.
//!
//! A stalled pipeline waits indefinitely; the frame driver
//! ([`FilterPipeline::process_frame`]) imposes the enclosing harness's
//! tick budget and surfaces a wedged run as [`PipelineError::Stalled`].

use crate::config::FilterConfig;
use crate::diagnostics::PerfCounters;
use crate::flow::FlowChannel;
use crate::lane::Lane;
use crate::mixer::ChannelMixer;
use crate::types::{
    ChannelId, Dimensions, PipelineError, RasterCoordinate, RasterTag, RgbPixel, Transfer,
};
use crate::window::LanePhase;

/// Consecutive no-progress ticks the frame driver tolerates before
/// declaring deadlock. Steady-state progress gaps are a handful of
/// ticks; this bound only trips on a genuinely wedged pipeline.
const IDLE_TICK_LIMIT: u64 = 1024;

/// The complete streaming filter pipeline for one RGB pixel stream.
#[derive(Debug)]
pub struct FilterPipeline {
    dims: Dimensions,
    config: FilterConfig,
    input: FlowChannel<RgbPixel>,
    lanes: [Lane; 3],
    mixer: ChannelMixer,
    output: FlowChannel<RgbPixel>,
    ticks: u64,
    stall_ticks: u64,
    /// Bypass decision for the frame currently entering the pipeline;
    /// resampled from `config.processing_enabled` at frame boundaries.
    bypass_active: bool,
    /// Whether the *input* side is mid-frame (the output side may still
    /// be draining after this goes false).
    in_input_frame: bool,
}

impl FilterPipeline {
    /// Create a pipeline for frames of the given dimensions with the
    /// default (pass-through) configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if either extent is
    /// zero.
    pub fn new(dims: Dimensions) -> Result<Self, PipelineError> {
        Self::with_config(dims, FilterConfig::default())
    }

    /// Create a pipeline with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if either extent is
    /// zero.
    pub fn with_config(dims: Dimensions, config: FilterConfig) -> Result<Self, PipelineError> {
        if dims.width == 0 || dims.height == 0 {
            return Err(PipelineError::InvalidDimensions {
                width: dims.width,
                height: dims.height,
            });
        }
        Ok(Self {
            dims,
            config,
            input: FlowChannel::new(),
            lanes: ChannelId::ALL.map(|channel| Lane::new(channel, dims)),
            mixer: ChannelMixer::new(),
            output: FlowChannel::new(),
            ticks: 0,
            stall_ticks: 0,
            bypass_active: !config.processing_enabled,
            in_input_frame: false,
        })
    }

    /// Configured frame dimensions.
    #[must_use]
    pub const fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Read the current configuration.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Mutate the configuration between ticks.
    ///
    /// Coefficient and activation changes take effect on the next
    /// scalar computed after the write — a frame in flight may see old
    /// and new coefficients split across its pixels.
    /// `processing_enabled` is the exception: it is resampled only at a
    /// frame boundary with the datapath drained.
    pub const fn config_mut(&mut self) -> &mut FilterConfig {
        &mut self.config
    }

    /// Whether the external input can accept a transfer this tick.
    #[must_use]
    pub const fn input_ready(&self) -> bool {
        self.input.can_accept()
    }

    /// Offer one RGB transfer on the external input. Returns `false`
    /// under backpressure; the caller must re-offer the same transfer
    /// later.
    pub fn offer_input(&mut self, transfer: Transfer<RgbPixel>) -> bool {
        self.input.offer(transfer)
    }

    /// Whether a processed transfer is waiting on the external output.
    #[must_use]
    pub const fn output_valid(&self) -> bool {
        self.output.is_valid()
    }

    /// Observe the offered output transfer without committing it.
    #[must_use]
    pub const fn peek_output(&self) -> Option<&Transfer<RgbPixel>> {
        self.output.peek()
    }

    /// Commit the offered output transfer (the external sink's `ready`).
    pub fn take_output(&mut self) -> Option<Transfer<RgbPixel>> {
        self.output.take()
    }

    /// Top-level mirror of the per-lane phase machine.
    #[must_use]
    pub fn phase(&self) -> LanePhase {
        if self
            .lanes
            .iter()
            .any(|lane| lane.phase() == LanePhase::Streaming)
        {
            LanePhase::Streaming
        } else if self
            .lanes
            .iter()
            .any(|lane| lane.phase() == LanePhase::Filling)
        {
            LanePhase::Filling
        } else {
            LanePhase::Idle
        }
    }

    /// Snapshot of the performance counters.
    #[must_use]
    pub const fn counters(&self) -> PerfCounters {
        PerfCounters {
            ticks: self.ticks,
            pixels_in: self.input.commits(),
            pixels_out: self.output.commits(),
            stall_ticks: self.stall_ticks,
        }
    }

    /// Advance the pipeline by one clock tick.
    pub fn tick(&mut self) {
        self.ticks += 1;

        // Resample the bypass switch only between frames, with nothing
        // in flight; a mid-frame toggle would strand in-flight windows.
        if !self.in_input_frame && self.input.commits() == self.output.commits() {
            self.bypass_active = !self.config.processing_enabled;
        }

        if self.bypass_active {
            if self.output.can_accept() {
                if let Some(transfer) = self.input.take() {
                    self.in_input_frame = !transfer.is_end_of_frame();
                    let offered = self.output.offer(transfer);
                    debug_assert!(offered);
                }
            }
        } else {
            // Sink to source: join, lanes, then the input broadcast.
            let [red, green, blue] = &mut self.lanes;
            self.mixer.step(
                red.output_mut(),
                green.output_mut(),
                blue.output_mut(),
                &mut self.output,
                &self.config.mix,
            );
            for lane in &mut self.lanes {
                lane.step(&self.config);
            }
            self.broadcast();
        }

        // The producer only interacts between ticks, so a transfer
        // still valid here was offered before this tick and not
        // consumed by it: a stall.
        if self.input.is_valid() {
            self.stall_ticks += 1;
        }
    }

    /// Fan one RGB transfer out to all three lanes, gated on every lane
    /// being ready.
    fn broadcast(&mut self) {
        if !self.input.is_valid() || !self.lanes.iter().all(Lane::input_ready) {
            return;
        }
        if let Some(transfer) = self.input.take() {
            self.in_input_frame = !transfer.is_end_of_frame();
            for lane in &mut self.lanes {
                let sample = transfer.payload.channel(lane.channel());
                let offered = lane.offer(Transfer::new(sample, transfer.end_of_row, transfer.tag));
                debug_assert!(offered);
            }
        }
    }

    /// Drive one complete frame through the pipeline against an
    /// always-ready sink and return the processed pixels in raster
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FrameSizeMismatch`] if `pixels` does
    /// not hold exactly `width * height` pixels, and
    /// [`PipelineError::Stalled`] if the pipeline stops making progress
    /// (which a conforming pipeline never does against a ready sink).
    pub fn process_frame(&mut self, pixels: &[RgbPixel]) -> Result<Vec<RgbPixel>, PipelineError> {
        let expected = self.dims.pixel_count();
        if pixels.len() as u64 != expected {
            return Err(PipelineError::FrameSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let mut processed = Vec::with_capacity(pixels.len());
        let mut fed = 0usize;
        let mut idle_ticks = 0u64;

        while processed.len() < pixels.len() {
            if let Some(transfer) = self.take_output() {
                processed.push(transfer.payload);
                idle_ticks = 0;
            }
            if fed < pixels.len() && self.input_ready() {
                let transfer = self.frame_transfer(pixels[fed], fed);
                let offered = self.offer_input(transfer);
                debug_assert!(offered);
                fed += 1;
            }

            let commits_before = self.input.commits() + self.output.commits();
            self.tick();
            let commits_after = self.input.commits() + self.output.commits();

            if commits_after == commits_before {
                idle_ticks += 1;
                if idle_ticks > IDLE_TICK_LIMIT {
                    return Err(PipelineError::Stalled { idle_ticks });
                }
            } else {
                idle_ticks = 0;
            }
        }

        Ok(processed)
    }

    /// Build the transfer for pixel `index` of a frame, marker and tag
    /// derived from the configured dimensions.
    fn frame_transfer(&self, pixel: RgbPixel, index: usize) -> Transfer<RgbPixel> {
        let index = index as u64;
        #[allow(clippy::cast_possible_truncation)]
        let coord = RasterCoordinate::new(
            (index / u64::from(self.dims.width)) as u32,
            (index % u64::from(self.dims.width)) as u32,
        );
        Transfer::new(
            pixel,
            coord.col + 1 == self.dims.width,
            RasterTag::for_coordinate(coord, self.dims),
        )
    }
}
