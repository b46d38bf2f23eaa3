//! rasterflow-pipeline: cycle-accurate streaming image filter core
//! (sans-IO).
//!
//! Models a fixed-function hardware image pipeline as a synchronous
//! discrete-time machine: a row-major RGB pixel stream enters through a
//! valid/ready flow-control channel, each color channel is windowed
//! into 3×3 neighborhoods and convolved with a signed 3×3 kernel
//! (depthwise stage), the three channel lanes are re-synchronized and
//! mixed by a 3×3 weight matrix with per-channel bias (pointwise
//! stage), and one processed pixel leaves per input pixel.
//!
//! Every stage boundary is a [`FlowChannel`] honoring the same
//! contract: a transfer commits only in a tick where the source holds
//! it valid and the sink is ready, offered payloads are held
//! bit-identical across stalls, and arbitrary downstream backpressure
//! never loses, duplicates, or reorders data.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! pixel buffers and channel endpoints. File loading and synthetic
//! test patterns live in `rasterflow-io`; the demo driver lives in
//! `rasterflow-bench`.
//!
//! # One-call entry point
//!
//! [`process`] runs a complete frame through a freshly constructed
//! pipeline and returns the processed pixels:
//!
//! ```rust
//! use rasterflow_pipeline::{process, Dimensions, FilterConfig, RgbPixel};
//!
//! # fn run() -> Result<(), rasterflow_pipeline::PipelineError> {
//! let dims = Dimensions::new(4, 4);
//! let frame = vec![RgbPixel::splat(10); 16];
//! let processed = process(&frame, dims, &FilterConfig::default())?;
//! assert_eq!(processed, frame); // default config is pass-through
//! # Ok(())
//! # }
//! ```
//!
//! Callers that need backpressure control, per-tick inspection, or
//! mid-stream configuration writes drive [`FilterPipeline`] directly.

pub mod config;
pub mod diagnostics;
pub mod filter;
pub mod flow;
pub mod lane;
pub mod mixer;
pub mod pipeline;
pub mod types;
pub mod window;

pub use config::{FilterConfig, Kernel3x3, KernelPreset, MixWeights};
pub use diagnostics::PerfCounters;
pub use flow::FlowChannel;
pub use pipeline::FilterPipeline;
pub use types::{
    ChannelId, Dimensions, Pixel, PipelineError, RasterCoordinate, RasterTag, RgbPixel, Transfer,
    Window3x3,
};
pub use window::LanePhase;

/// Run one complete frame through the streaming pipeline.
///
/// Constructs a [`FilterPipeline`] for `dims` with `config`, drives
/// `pixels` through it against an always-ready sink, and returns the
/// processed pixels in raster order. One output pixel is produced per
/// input pixel.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] if either extent of
/// `dims` is zero, and [`PipelineError::FrameSizeMismatch`] if
/// `pixels.len()` is not `width * height`.
pub fn process(
    pixels: &[RgbPixel],
    dims: Dimensions,
    config: &FilterConfig,
) -> Result<Vec<RgbPixel>, PipelineError> {
    let mut pipeline = FilterPipeline::with_config(dims, *config)?;
    pipeline.process_frame(pixels)
}
