//! Filter configuration: convolution kernels, channel-mix weights, and
//! activation settings.
//!
//! Configuration is read-mostly state owned by whoever owns the
//! pipeline. Compute stages never hold references into it across ticks;
//! they copy the coefficients they need at the instant they perform a
//! computation, so a write between ticks takes effect on the first
//! scalar computed afterwards and never mid-computation.

use serde::{Deserialize, Serialize};

/// Nine signed 8-bit coefficients for the per-channel spatial filter,
/// row-major, top row first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kernel3x3 {
    /// Coefficients, `coefficients[ky][kx]` multiplying the window
    /// sample at `(dy, dx) = (ky - 1, kx - 1)`.
    pub coefficients: [[i8; 3]; 3],
}

impl Kernel3x3 {
    /// Pass-through: center weight 1, all else 0.
    pub const IDENTITY: Self = Self::new([[0, 0, 0], [0, 1, 0], [0, 0, 0]]);

    /// Edge enhancement.
    pub const SHARPEN: Self = Self::new([[0, -2, 0], [-2, 9, -2], [0, -2, 0]]);

    /// Laplacian edge detector: uniform regions map to zero.
    pub const EDGE_DETECT: Self = Self::new([[-1, -1, -1], [-1, 8, -1], [-1, -1, -1]]);

    /// Unnormalized box blur (sum of the neighborhood).
    pub const BOX_BLUR: Self = Self::new([[1, 1, 1], [1, 1, 1], [1, 1, 1]]);

    /// Directional relief effect.
    pub const EMBOSS: Self = Self::new([[-2, -1, 0], [-1, 1, 1], [0, 1, 2]]);

    /// Create a kernel from row-major coefficients.
    #[must_use]
    pub const fn new(coefficients: [[i8; 3]; 3]) -> Self {
        Self { coefficients }
    }

    /// The coefficient multiplying the window sample at offset
    /// `(dy, dx)` from the center, each in `-1..=1`.
    #[must_use]
    pub fn coefficient(&self, dy: i32, dx: i32) -> i8 {
        debug_assert!((-1..=1).contains(&dy) && (-1..=1).contains(&dx));
        self.coefficients[(dy + 1).unsigned_abs() as usize][(dx + 1).unsigned_abs() as usize]
    }

    /// Sum of all nine coefficients.
    #[must_use]
    pub fn weight_sum(&self) -> i32 {
        self.coefficients
            .iter()
            .flatten()
            .map(|&c| i32::from(c))
            .sum()
    }
}

impl Default for Kernel3x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Named spatial kernels matching the original register-map demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelPreset {
    /// Pass-through.
    Identity,
    /// Edge enhancement.
    Sharpen,
    /// Laplacian edge detection.
    EdgeDetect,
    /// Unnormalized box blur.
    BoxBlur,
    /// Directional relief.
    Emboss,
}

impl KernelPreset {
    /// The kernel this preset names.
    #[must_use]
    pub const fn kernel(self) -> Kernel3x3 {
        match self {
            Self::Identity => Kernel3x3::IDENTITY,
            Self::Sharpen => Kernel3x3::SHARPEN,
            Self::EdgeDetect => Kernel3x3::EDGE_DETECT,
            Self::BoxBlur => Kernel3x3::BOX_BLUR,
            Self::Emboss => Kernel3x3::EMBOSS,
        }
    }
}

/// Cross-channel mixing coefficients: a 3×3 signed weight matrix plus a
/// signed 16-bit bias per output channel.
///
/// Output channel `o` is `clamp(biases[o] + Σ_c weights[o][c] * lane_c,
/// 0, 255)` with a saturating clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixWeights {
    /// `weights[output][input]`, both indexed R, G, B.
    pub weights: [[i8; 3]; 3],
    /// Per-output-channel bias, applied before clamping.
    pub biases: [i16; 3],
}

impl MixWeights {
    /// No mixing: each output channel equals its own lane, zero bias.
    pub const IDENTITY: Self = Self {
        weights: [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
        biases: [0, 0, 0],
    };

    /// Create mixing coefficients from a weight matrix and biases.
    #[must_use]
    pub const fn new(weights: [[i8; 3]; 3], biases: [i16; 3]) -> Self {
        Self { weights, biases }
    }
}

impl Default for MixWeights {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// The full register set sampled by the compute stages.
///
/// Writable at any point between ticks; every field except
/// `processing_enabled` takes effect on the next scalar computed after
/// the write. `processing_enabled` is sampled once per frame, at the
/// first input transfer of that frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Spatial kernel, shared by all three channel lanes.
    pub kernel: Kernel3x3,
    /// Floor-clamp activation after the spatial filter. This is a
    /// floor, not a zero-ReLU: `result = max(acc, relu_threshold)`.
    /// Callers wanting a zero-floor set the threshold to 0.
    pub relu_enabled: bool,
    /// Clamp floor applied when `relu_enabled` is set.
    pub relu_threshold: i8,
    /// Cross-channel mixing coefficients.
    pub mix: MixWeights,
    /// When false, the compute stages are bypassed and input transfers
    /// pass to the output unmodified.
    pub processing_enabled: bool,
}

impl FilterConfig {
    /// Default activation floor.
    pub const DEFAULT_RELU_THRESHOLD: i8 = 0;

    /// Configuration with a given spatial kernel and everything else at
    /// defaults.
    #[must_use]
    pub fn with_kernel(kernel: Kernel3x3) -> Self {
        Self {
            kernel,
            ..Self::default()
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel3x3::IDENTITY,
            relu_enabled: false,
            relu_threshold: Self::DEFAULT_RELU_THRESHOLD,
            mix: MixWeights::IDENTITY,
            processing_enabled: true,
        }
    }
}
