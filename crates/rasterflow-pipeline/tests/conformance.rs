//! End-to-end conformance tests for the streaming pipeline: protocol
//! invariants under hostile stall patterns, stream-level algebra, and
//! the configuration effect boundary.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rasterflow_pipeline::{
    Dimensions, FilterConfig, FilterPipeline, Kernel3x3, MixWeights, RasterCoordinate, RasterTag,
    RgbPixel, Transfer,
};

/// Deterministic pseudo-random bit stream for stall patterns.
struct Lcg(u64);

impl Lcg {
    fn next_bool(&mut self, permille_true: u64) -> bool {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) % 1000 < permille_true
    }
}

fn frame_transfer(pixel: RgbPixel, index: usize, dims: Dimensions) -> Transfer<RgbPixel> {
    let coord = RasterCoordinate::new(index as u32 / dims.width, index as u32 % dims.width);
    Transfer::new(
        pixel,
        coord.col + 1 == dims.width,
        RasterTag::for_coordinate(coord, dims),
    )
}

/// Drive one frame with scripted source/sink cooperation, verifying
/// the external handshake invariants every tick:
///
/// - an offered output payload stays bit-identical until taken;
/// - committed outputs arrive in raster order, one per input.
fn run_with_schedule(
    pipeline: &mut FilterPipeline,
    pixels: &[RgbPixel],
    mut source_willing: impl FnMut(u64) -> bool,
    mut sink_willing: impl FnMut(u64) -> bool,
) -> Vec<Transfer<RgbPixel>> {
    let mut outputs: Vec<Transfer<RgbPixel>> = Vec::new();
    let mut fed = 0usize;
    let mut tick = 0u64;
    let mut held: Option<Transfer<RgbPixel>> = None;

    while outputs.len() < pixels.len() {
        assert!(tick < 1_000_000, "run did not converge");

        if let Some(offered) = pipeline.peek_output().copied() {
            if let Some(previous) = held {
                assert_eq!(
                    previous, offered,
                    "offered output changed during a stall at tick {tick}",
                );
            }
            if sink_willing(tick) {
                outputs.push(pipeline.take_output().unwrap());
                held = None;
            } else {
                held = Some(offered);
            }
        }

        if fed < pixels.len() && source_willing(tick) && pipeline.input_ready() {
            assert!(pipeline.offer_input(frame_transfer(pixels[fed], fed, pipeline.dims())));
            fed += 1;
        }

        pipeline.tick();
        tick += 1;
    }
    outputs
}

fn gradient_frame(dims: Dimensions) -> Vec<RgbPixel> {
    (0..dims.pixel_count())
        .map(|i| {
            let row = (i / u64::from(dims.width)) as u8;
            let col = (i % u64::from(dims.width)) as u8;
            RgbPixel::new(col.wrapping_mul(31), row.wrapping_mul(47), col ^ row)
        })
        .collect()
}

#[test]
fn reset_quiescence_no_output_before_data() {
    let mut pipeline = FilterPipeline::new(Dimensions::new(4, 4)).unwrap();
    assert!(!pipeline.output_valid(), "valid asserted at reset");
    for _ in 0..10 {
        pipeline.tick();
        assert!(!pipeline.output_valid(), "valid asserted with no input");
    }
    assert_eq!(pipeline.counters().pixels_out, 0);
}

#[test]
fn spec_scenario_4x4_identity() {
    // 4x4 single-value frame, identity kernel, threshold disabled,
    // identity mix, zero bias: output equals input, 16 transfers for
    // 16, markers at transfers 3, 7, 11, 15.
    let dims = Dimensions::new(4, 4);
    let mut pipeline = FilterPipeline::new(dims).unwrap();
    let frame = vec![RgbPixel::splat(10); 16];

    let outputs = run_with_schedule(&mut pipeline, &frame, |_| true, |_| true);

    assert_eq!(outputs.len(), 16);
    for (i, t) in outputs.iter().enumerate() {
        assert_eq!(t.payload, RgbPixel::splat(10), "payload at {i}");
        assert_eq!(t.end_of_row, matches!(i, 3 | 7 | 11 | 15), "marker at {i}");
    }
    let counters = pipeline.counters();
    assert_eq!(counters.pixels_in, 16);
    assert_eq!(counters.pixels_out, 16);
}

#[test]
fn jittery_sink_output_matches_eager_sink() {
    let dims = Dimensions::new(9, 7);
    let frame = gradient_frame(dims);
    let config = FilterConfig::with_kernel(Kernel3x3::SHARPEN);

    let mut eager = FilterPipeline::with_config(dims, config).unwrap();
    let reference = run_with_schedule(&mut eager, &frame, |_| true, |_| true);

    // A sink ready ~30% of ticks and a source willing ~60% of ticks
    // must produce the identical transfer sequence.
    let mut jittery = FilterPipeline::with_config(dims, config).unwrap();
    let mut sink_bits = Lcg(0x2545_F491_4F6C_DD1D);
    let mut source_bits = Lcg(0x9E37_79B9_7F4A_7C15);
    let jittered = run_with_schedule(
        &mut jittery,
        &frame,
        move |_| source_bits.next_bool(600),
        move |_| sink_bits.next_bool(300),
    );

    assert_eq!(jittered, reference);
    assert!(
        jittery.counters().stall_ticks > 0,
        "the jittery run should actually have stalled",
    );
}

#[test]
fn per_channel_identity_streams_are_independent() {
    // Distinct data per channel; identity kernel and mix must return
    // each channel's own stream untouched (linearity check).
    let dims = Dimensions::new(6, 6);
    let frame: Vec<RgbPixel> = (0..36u8).map(|i| RgbPixel::new(i, 100 + i, 219 - i)).collect();
    let mut pipeline = FilterPipeline::new(dims).unwrap();
    let outputs = run_with_schedule(&mut pipeline, &frame, |_| true, |_| true);
    let pixels: Vec<RgbPixel> = outputs.into_iter().map(|t| t.payload).collect();
    assert_eq!(pixels, frame);
}

#[test]
fn saturating_mix_never_wraps() {
    let dims = Dimensions::new(4, 4);
    let frame = vec![RgbPixel::splat(100); 16];

    // Bias far above range: every channel pins at 255.
    let mut config = FilterConfig::default();
    config.mix = MixWeights::new(MixWeights::IDENTITY.weights, [30_000, 30_000, 30_000]);
    let mut high = FilterPipeline::with_config(dims, config).unwrap();
    for t in run_with_schedule(&mut high, &frame, |_| true, |_| true) {
        assert_eq!(t.payload, RgbPixel::splat(255));
    }

    // Bias far below range: every channel pins at 0.
    config.mix = MixWeights::new(MixWeights::IDENTITY.weights, [-30_000, -30_000, -30_000]);
    let mut low = FilterPipeline::with_config(dims, config).unwrap();
    for t in run_with_schedule(&mut low, &frame, |_| true, |_| true) {
        assert_eq!(t.payload, RgbPixel::splat(0));
    }
}

#[test]
fn activation_floor_is_observable_end_to_end() {
    // Negated-identity kernel maps uniform 10 to -10. Without the
    // floor the mixer clamps that to 0; with a floor of 5 the scalar
    // is lifted to 5 before mixing.
    let dims = Dimensions::new(3, 3);
    let frame = vec![RgbPixel::splat(10); 9];
    let negated = Kernel3x3::new([[0, 0, 0], [0, -1, 0], [0, 0, 0]]);

    let mut config = FilterConfig::with_kernel(negated);
    let mut without = FilterPipeline::with_config(dims, config).unwrap();
    for t in run_with_schedule(&mut without, &frame, |_| true, |_| true) {
        assert_eq!(t.payload, RgbPixel::splat(0));
    }

    config.relu_enabled = true;
    config.relu_threshold = 5;
    let mut with = FilterPipeline::with_config(dims, config).unwrap();
    for t in run_with_schedule(&mut with, &frame, |_| true, |_| true) {
        assert_eq!(t.payload, RgbPixel::splat(5));
    }
}

#[test]
fn cross_channel_rotation_mix() {
    let dims = Dimensions::new(4, 4);
    let frame = vec![RgbPixel::new(10, 20, 30); 16];
    let mut config = FilterConfig::default();
    // Output R from G, G from B, B from R.
    config.mix = MixWeights::new([[0, 1, 0], [0, 0, 1], [1, 0, 0]], [0, 0, 0]);

    let mut pipeline = FilterPipeline::with_config(dims, config).unwrap();
    for t in run_with_schedule(&mut pipeline, &frame, |_| true, |_| true) {
        assert_eq!(t.payload, RgbPixel::new(20, 30, 10));
    }
}

/// Expected Laplacian response for a uniform frame of `value`.
fn edge_detect_expectation(coord: RasterCoordinate, dims: Dimensions, value: i32) -> u8 {
    let mut neighbors = 0i32;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if (dy, dx) == (0, 0) {
                continue;
            }
            let row = i64::from(coord.row) + dy;
            let col = i64::from(coord.col) + dx;
            if row >= 0 && row < i64::from(dims.height) && col >= 0 && col < i64::from(dims.width) {
                neighbors += 1;
            }
        }
    }
    (8 * value - neighbors * value).clamp(0, 255) as u8
}

#[test]
fn coefficient_update_applies_to_next_scalar() {
    let dims = Dimensions::new(6, 6);
    let frame = vec![RgbPixel::splat(10); 36];
    let mut pipeline = FilterPipeline::new(dims).unwrap();

    // Drive the frame; after six outputs have committed, swap the
    // kernel mid-frame.
    let mut outputs = Vec::new();
    let mut fed = 0usize;
    let mut swapped = false;
    let mut guard = 0;
    while outputs.len() < frame.len() {
        guard += 1;
        assert!(guard < 10_000, "run did not converge");
        if let Some(t) = pipeline.take_output() {
            outputs.push(t.payload);
        }
        if outputs.len() >= 6 && !swapped {
            pipeline.config_mut().kernel = Kernel3x3::EDGE_DETECT;
            swapped = true;
        }
        if fed < frame.len() && pipeline.input_ready() {
            assert!(pipeline.offer_input(frame_transfer(frame[fed], fed, dims)));
            fed += 1;
        }
        pipeline.tick();
    }

    // Identity on uniform 10 yields 10; edge detect yields a value
    // that differs from 10 at every coordinate, so the effect boundary
    // is the first non-10 output.
    let boundary = outputs
        .iter()
        .position(|p| *p != RgbPixel::splat(10))
        .expect("kernel update never took effect");
    assert!(
        boundary >= 6,
        "update retroactively rewrote already-committed output {boundary}",
    );
    assert!(
        boundary <= 16,
        "update took implausibly long to reach the stream (boundary {boundary})",
    );
    for (i, pixel) in outputs.iter().enumerate().skip(boundary) {
        let coord = RasterCoordinate::new(i as u32 / dims.width, i as u32 % dims.width);
        let expected = edge_detect_expectation(coord, dims, 10);
        assert_eq!(*pixel, RgbPixel::splat(expected), "output {i} after update");
    }
}

#[test]
fn back_to_back_frames_are_reproducible() {
    let dims = Dimensions::new(5, 4);
    let frame = gradient_frame(dims);
    let config = FilterConfig::with_kernel(Kernel3x3::EMBOSS);
    let mut pipeline = FilterPipeline::with_config(dims, config).unwrap();

    let first = pipeline.process_frame(&frame).unwrap();
    let second = pipeline.process_frame(&frame).unwrap();
    assert_eq!(first, second, "frame state leaked across the boundary");

    let counters = pipeline.counters();
    assert_eq!(counters.pixels_in, 40);
    assert_eq!(counters.pixels_out, 40);
}
