//! One color lane: window construction chained into spatial filtering.
//!
//! The three lanes are identical machines differing only in channel
//! identity; instantiating one type three times (rather than three
//! copy-pasted state machines) keeps the per-lane protocol behavior in
//! one place.

use crate::config::FilterConfig;
use crate::filter::{Activation, SpatialFilterEngine};
use crate::flow::FlowChannel;
use crate::types::{ChannelId, Dimensions, FilterResult, Pixel, Transfer, Window3x3};
use crate::window::{LanePhase, WindowBuilder};

/// A windowing + filtering lane for one color channel.
#[derive(Debug)]
pub struct Lane {
    channel: ChannelId,
    input: FlowChannel<Pixel>,
    builder: WindowBuilder,
    windows: FlowChannel<Window3x3>,
    engine: SpatialFilterEngine,
    output: FlowChannel<FilterResult>,
}

impl Lane {
    /// Create a lane for the given channel and frame dimensions.
    #[must_use]
    pub fn new(channel: ChannelId, dims: Dimensions) -> Self {
        Self {
            channel,
            input: FlowChannel::new(),
            builder: WindowBuilder::new(dims),
            windows: FlowChannel::new(),
            engine: SpatialFilterEngine::new(),
            output: FlowChannel::new(),
        }
    }

    /// Which color channel this lane processes.
    #[must_use]
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    /// This lane's current phase.
    #[must_use]
    pub const fn phase(&self) -> LanePhase {
        self.builder.phase()
    }

    /// Whether the lane can take one more input pixel (its contribution
    /// to the pipeline's external `ready`).
    #[must_use]
    pub const fn input_ready(&self) -> bool {
        self.input.can_accept()
    }

    /// Offer one pixel into the lane. Returns `false` under
    /// backpressure.
    pub fn offer(&mut self, transfer: Transfer<Pixel>) -> bool {
        self.input.offer(transfer)
    }

    /// Committed input pixels.
    #[must_use]
    pub const fn pixels_consumed(&self) -> u64 {
        self.input.commits()
    }

    /// The lane's scalar output channel, consumed by the mixer.
    pub const fn output_mut(&mut self) -> &mut FlowChannel<FilterResult> {
        &mut self.output
    }

    /// Advance the lane by one tick, downstream stage first so a value
    /// committed by the filter this tick frees the window channel for
    /// the builder in the same tick.
    pub fn step(&mut self, config: &FilterConfig) {
        let activation = Activation {
            enabled: config.relu_enabled,
            threshold: config.relu_threshold,
        };
        self.engine.step(
            &mut self.windows,
            &mut self.output,
            &config.kernel,
            activation,
        );
        self.builder.step(&mut self.input, &mut self.windows);
    }
}
