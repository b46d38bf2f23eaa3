//! rasterflow-bench: drive frames through the simulated pipeline and
//! collect diagnostics.
//!
//! Runs an image file or a synthetic test pattern through the
//! cycle-accurate pipeline with configurable coefficients, optionally
//! injecting sink backpressure to exercise the flow-control protocol,
//! and prints the performance counters. Useful for:
//!
//! - Comparing kernel presets on the classic bring-up patterns
//! - Watching stall rate and throughput degrade under backpressure
//! - Saving processed frames for visual inspection
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin rasterflow-bench -- --pattern gradient --preset edge-detect
//! cargo run --release --bin rasterflow-bench -- photo.png --stall-permille 500 --json
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use rasterflow_io::patterns;
use rasterflow_pipeline::{
    Dimensions, FilterConfig, FilterPipeline, KernelPreset, RasterCoordinate, RasterTag, RgbPixel,
    Transfer,
};

/// Pipeline parameter experimentation and diagnostics for rasterflow.
///
/// Streams a frame through the simulated pipeline tick by tick and
/// prints transfer counters, throughput, and stall rate.
#[derive(Parser)]
#[command(name = "rasterflow-bench", version)]
struct Cli {
    /// Path to an input image (PNG, JPEG, BMP). Mutually exclusive
    /// with --pattern.
    image_path: Option<PathBuf>,

    /// Synthetic test pattern to generate instead of loading a file.
    #[arg(long, value_enum, conflicts_with = "image_path")]
    pattern: Option<Pattern>,

    /// Width of the generated pattern.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Height of the generated pattern.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Spatial kernel preset.
    #[arg(long, value_enum, default_value_t = Preset::Identity)]
    preset: Preset,

    /// Enable the activation floor after the spatial filter.
    #[arg(long)]
    relu: bool,

    /// Activation floor value.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_RELU_THRESHOLD, allow_negative_numbers = true)]
    relu_threshold: i8,

    /// Per-mille of ticks the output sink refuses transfers
    /// (0 = always ready, 900 = ready 10% of the time).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(..=999))]
    stall_permille: u64,

    /// Write the processed frame to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output counters as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, --preset, --relu, and --relu-threshold are
    /// ignored. The JSON must be a valid `FilterConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Synthetic pattern selection.
#[derive(Clone, Copy, ValueEnum)]
enum Pattern {
    /// RGB gradient (red by column, green by row, blue by sum).
    Gradient,
    /// Black and white checkerboard.
    Checkerboard,
    /// Gray field with white horizontal and black vertical bands.
    EdgeGrid,
}

/// Spatial kernel preset selection.
#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Identity,
    Sharpen,
    EdgeDetect,
    BoxBlur,
    Emboss,
}

impl Preset {
    const fn to_preset(self) -> KernelPreset {
        match self {
            Self::Identity => KernelPreset::Identity,
            Self::Sharpen => KernelPreset::Sharpen,
            Self::EdgeDetect => KernelPreset::EdgeDetect,
            Self::BoxBlur => KernelPreset::BoxBlur,
            Self::Emboss => KernelPreset::Emboss,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let (frame, dims) = load_input(cli)?;
    let config = build_config(cli)?;

    let mut pipeline =
        FilterPipeline::with_config(dims, config).map_err(|e| e.to_string())?;

    let processed = if cli.stall_permille == 0 {
        pipeline
            .process_frame(&frame)
            .map_err(|e| e.to_string())?
    } else {
        drive_with_stalls(&mut pipeline, &frame, cli.stall_permille)?
    };

    let counters = pipeline.counters();
    if cli.json {
        let json = serde_json::to_string_pretty(&counters).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        println!("Frame: {}x{} ({} pixels)", dims.width, dims.height, dims.pixel_count());
        println!("{}", counters.report());
    }

    if let Some(ref path) = cli.output {
        rasterflow_io::save_frame(path, &processed, dims).map_err(|e| e.to_string())?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Load the input frame from a file or generate the requested pattern.
fn load_input(cli: &Cli) -> Result<(Vec<RgbPixel>, Dimensions), String> {
    if let Some(ref path) = cli.image_path {
        return rasterflow_io::load_frame(path).map_err(|e| e.to_string());
    }

    let dims = Dimensions::new(cli.width, cli.height);
    if dims.width == 0 || dims.height == 0 {
        return Err(format!("invalid pattern dimensions {}x{}", dims.width, dims.height));
    }
    let frame = match cli.pattern.unwrap_or(Pattern::Gradient) {
        Pattern::Gradient => patterns::gradient(dims),
        Pattern::Checkerboard => patterns::checkerboard(dims, patterns::DEFAULT_SQUARE_SIZE),
        Pattern::EdgeGrid => {
            patterns::edge_grid(dims, patterns::DEFAULT_GRID_SPACING, patterns::DEFAULT_GRID_BAND)
        }
    };
    Ok((frame, dims))
}

/// Resolve the pipeline configuration from CLI flags or raw JSON.
fn build_config(cli: &Cli) -> Result<FilterConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("invalid --config-json: {e}"));
    }
    let mut config = FilterConfig::with_kernel(cli.preset.to_preset().kernel());
    config.relu_enabled = cli.relu;
    config.relu_threshold = cli.relu_threshold;
    Ok(config)
}

/// Drive a frame with the sink refusing roughly `stall_permille`/1000
/// of ticks, so backpressure propagates all the way to the input.
fn drive_with_stalls(
    pipeline: &mut FilterPipeline,
    frame: &[RgbPixel],
    stall_permille: u64,
) -> Result<Vec<RgbPixel>, String> {
    let dims = pipeline.dims();
    if frame.len() as u64 != dims.pixel_count() {
        return Err(format!(
            "frame has {} pixels but the pipeline expects {}",
            frame.len(),
            dims.pixel_count(),
        ));
    }

    let mut rng: u64 = 0x2545_F491_4F6C_DD1D;
    let mut processed = Vec::with_capacity(frame.len());
    let mut fed = 0usize;
    let mut idle_ticks = 0u64;

    while processed.len() < frame.len() {
        rng = rng
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let sink_ready = (rng >> 33) % 1000 >= stall_permille;

        if sink_ready {
            if let Some(t) = pipeline.take_output() {
                processed.push(t.payload);
                idle_ticks = 0;
            }
        }
        if fed < frame.len() && pipeline.input_ready() {
            let coord = RasterCoordinate::new(
                fed as u32 / dims.width,
                fed as u32 % dims.width,
            );
            let transfer = Transfer::new(
                frame[fed],
                coord.col + 1 == dims.width,
                RasterTag::for_coordinate(coord, dims),
            );
            if pipeline.offer_input(transfer) {
                fed += 1;
            }
        }
        pipeline.tick();

        idle_ticks += 1;
        if idle_ticks > 1_000_000 {
            return Err("pipeline made no progress under injected stalls".to_owned());
        }
    }

    Ok(processed)
}
