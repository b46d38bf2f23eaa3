//! Per-channel 3×3 spatial convolution with optional floor-clamp
//! activation.
//!
//! The accumulator is exact `i32` arithmetic: nine products of an
//! unsigned 8-bit sample and a signed 8-bit coefficient have magnitude
//! at most `9 * 255 * 127 = 291_465`, so overflow is precluded by
//! sizing, not by runtime checks. No truncation happens here; the
//! signed accumulator travels to the channel mixer untouched.
//!
//! The engine samples its coefficients once per computation (never
//! mid-computation), so a configuration write takes effect on the next
//! scalar computed after it.

use crate::config::Kernel3x3;
use crate::flow::FlowChannel;
use crate::types::{FilterResult, Window3x3};

/// Activation settings sampled alongside the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// Whether the floor clamp is applied at all.
    pub enabled: bool,
    /// The clamp floor. This is not a zero-ReLU: the configured floor
    /// is the minimum, and callers wanting `max(x, 0)` set it to 0.
    pub threshold: i8,
}

impl Activation {
    /// Activation disabled; the raw accumulator passes through.
    pub const DISABLED: Self = Self {
        enabled: false,
        threshold: 0,
    };
}

/// Exact 3×3 multiply-accumulate of one window against one kernel.
#[must_use]
pub fn convolve(window: &Window3x3, kernel: &Kernel3x3) -> i32 {
    let mut acc = 0i32;
    for ky in 0..3 {
        for kx in 0..3 {
            acc += i32::from(window.samples[ky][kx]) * i32::from(kernel.coefficients[ky][kx]);
        }
    }
    acc
}

/// Apply the floor clamp to an accumulator value.
#[must_use]
pub fn activate(acc: i32, activation: Activation) -> i32 {
    if activation.enabled {
        acc.max(i32::from(activation.threshold))
    } else {
        acc
    }
}

/// One lane's spatial filter stage: window transfers in, scalar
/// transfers out, backpressure honored on both sides.
#[derive(Debug, Default)]
pub struct SpatialFilterEngine {
    computed: u64,
}

impl SpatialFilterEngine {
    /// Create an idle engine.
    #[must_use]
    pub const fn new() -> Self {
        Self { computed: 0 }
    }

    /// Number of scalars computed since construction.
    #[must_use]
    pub const fn computed(&self) -> u64 {
        self.computed
    }

    /// Advance this stage by one tick.
    ///
    /// Consumes at most one window and produces at most one scalar. The
    /// window is only consumed when the output slot can hold its
    /// result, so a downstream stall never drops a computation.
    pub fn step(
        &mut self,
        input: &mut FlowChannel<Window3x3>,
        output: &mut FlowChannel<FilterResult>,
        kernel: &Kernel3x3,
        activation: Activation,
    ) {
        if !output.can_accept() || !input.is_valid() {
            return;
        }

        // Snapshot the coefficients for this computation.
        let kernel = *kernel;

        if let Some(transfer) = input.take() {
            let coord = transfer.payload.center;
            let result = transfer.map(|window| FilterResult {
                value: activate(convolve(&window, &kernel), activation),
                coord,
            });
            let offered = output.offer(result);
            debug_assert!(offered);
            self.computed += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{RasterCoordinate, RasterTag, Transfer};

    fn window(samples: [[u8; 3]; 3]) -> Window3x3 {
        Window3x3::new(samples, RasterCoordinate::new(1, 1))
    }

    #[test]
    fn identity_kernel_returns_center() {
        let w = window([[1, 2, 3], [4, 5, 6], [7, 8, 9]]);
        assert_eq!(convolve(&w, &Kernel3x3::IDENTITY), 5);
    }

    #[test]
    fn edge_detect_zeroes_uniform_window() {
        let w = window([[10; 3]; 3]);
        assert_eq!(convolve(&w, &Kernel3x3::EDGE_DETECT), 0);
    }

    #[test]
    fn accumulator_reaches_algebraic_extremes_without_overflow() {
        let all_max = window([[255; 3]; 3]);
        let max_kernel = Kernel3x3::new([[127; 3]; 3]);
        assert_eq!(convolve(&all_max, &max_kernel), 9 * 255 * 127);

        let min_kernel = Kernel3x3::new([[-128; 3]; 3]);
        assert_eq!(convolve(&all_max, &min_kernel), 9 * 255 * -128);
    }

    #[test]
    fn activation_is_a_floor_not_a_zero_relu() {
        let floor5 = Activation {
            enabled: true,
            threshold: 5,
        };
        assert_eq!(activate(1, floor5), 5);
        assert_eq!(activate(5, floor5), 5);
        assert_eq!(activate(100, floor5), 100);
        // Negative floors are legal and clamp upward to the floor.
        let floor_neg = Activation {
            enabled: true,
            threshold: -10,
        };
        assert_eq!(activate(-100, floor_neg), -10);
        assert_eq!(activate(-5, floor_neg), -5);
    }

    #[test]
    fn disabled_activation_passes_negatives_through() {
        assert_eq!(activate(-123, Activation::DISABLED), -123);
    }

    #[test]
    fn step_does_not_consume_when_output_is_stalled() {
        let mut engine = SpatialFilterEngine::new();
        let mut input = FlowChannel::new();
        let mut output = FlowChannel::new();

        let t = Transfer::new(window([[10; 3]; 3]), false, RasterTag::empty());
        assert!(input.offer(t));

        // Fill the output slot so the engine has nowhere to put a result.
        assert!(output.offer(Transfer::new(
            FilterResult {
                value: 0,
                coord: RasterCoordinate::new(0, 0),
            },
            false,
            RasterTag::empty(),
        )));

        engine.step(
            &mut input,
            &mut output,
            &Kernel3x3::IDENTITY,
            Activation::DISABLED,
        );
        assert!(input.is_valid(), "window must be held, not dropped");
        assert_eq!(engine.computed(), 0);

        // Free the output and the held window flows through.
        output.take();
        engine.step(
            &mut input,
            &mut output,
            &Kernel3x3::IDENTITY,
            Activation::DISABLED,
        );
        assert!(!input.is_valid());
        assert_eq!(output.peek().unwrap().payload.value, 10);
        assert_eq!(engine.computed(), 1);
    }

    #[test]
    fn step_preserves_marker_tag_and_coordinate() {
        let mut engine = SpatialFilterEngine::new();
        let mut input = FlowChannel::new();
        let mut output = FlowChannel::new();

        let dims_tag = RasterTag::for_coordinate(
            RasterCoordinate::new(2, 2),
            crate::types::Dimensions::new(3, 3),
        );
        let w = Window3x3::new([[0; 3]; 3], RasterCoordinate::new(2, 2));
        assert!(input.offer(Transfer::new(w, true, dims_tag)));

        engine.step(
            &mut input,
            &mut output,
            &Kernel3x3::IDENTITY,
            Activation::DISABLED,
        );

        let out = output.take().unwrap();
        assert!(out.end_of_row);
        assert!(out.tag.is_last_row());
        assert_eq!(out.payload.coord, RasterCoordinate::new(2, 2));
    }
}
