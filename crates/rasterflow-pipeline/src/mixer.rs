//! Cross-channel mixing: the pointwise (1×1) stage joining the three
//! spatial-filter lanes back into one RGB stream.
//!
//! The mixer is also the lane synchronization barrier. It proceeds only
//! once all three lanes offer a scalar for the same raster coordinate;
//! until then it withholds `ready` from the lanes that have already
//! arrived, so an independently stalled lane can never be consumed out
//! of step. Lanes all process the same transfer sequence in FIFO order,
//! which makes coordinate agreement a structural invariant — it is
//! still checked in debug builds.

use crate::config::MixWeights;
use crate::flow::FlowChannel;
use crate::types::{FilterResult, RgbPixel, Transfer};

/// Joins three per-lane scalar streams into one mixed RGB stream.
#[derive(Debug, Default)]
pub struct ChannelMixer {
    mixed: u64,
}

impl ChannelMixer {
    /// Create an idle mixer.
    #[must_use]
    pub const fn new() -> Self {
        Self { mixed: 0 }
    }

    /// Number of output pixels mixed since construction.
    #[must_use]
    pub const fn mixed(&self) -> u64 {
        self.mixed
    }

    /// Advance this stage by one tick: consume one scalar per lane and
    /// produce one RGB pixel, if all three lanes and the output align.
    pub fn step(
        &mut self,
        red: &mut FlowChannel<FilterResult>,
        green: &mut FlowChannel<FilterResult>,
        blue: &mut FlowChannel<FilterResult>,
        output: &mut FlowChannel<RgbPixel>,
        mix: &MixWeights,
    ) {
        if !output.can_accept() {
            return;
        }
        // The join: every lane must hold a scalar before any is taken.
        if !(red.is_valid() && green.is_valid() && blue.is_valid()) {
            return;
        }

        // Snapshot the coefficients for this computation.
        let mix = *mix;

        let (Some(r), Some(g), Some(b)) = (red.take(), green.take(), blue.take()) else {
            return;
        };
        debug_assert_eq!(r.payload.coord, g.payload.coord, "lane desync");
        debug_assert_eq!(r.payload.coord, b.payload.coord, "lane desync");
        debug_assert_eq!((r.end_of_row, r.tag), (g.end_of_row, g.tag));
        debug_assert_eq!((r.end_of_row, r.tag), (b.end_of_row, b.tag));

        let lanes = [r.payload.value, g.payload.value, b.payload.value];
        let pixel = mix_pixel(&mix, lanes);

        let offered = output.offer(Transfer::new(pixel, r.end_of_row, r.tag));
        debug_assert!(offered);
        self.mixed += 1;
    }
}

/// Mix three lane scalars into one output pixel with a saturating
/// clamp per channel.
#[must_use]
pub fn mix_pixel(mix: &MixWeights, lanes: [i32; 3]) -> RgbPixel {
    let mut out = [0u8; 3];
    for (o, channel) in out.iter_mut().enumerate() {
        let mut acc = i32::from(mix.biases[o]);
        for (c, &lane) in lanes.iter().enumerate() {
            acc += i32::from(mix.weights[o][c]) * lane;
        }
        // Saturate, never wrap.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            *channel = acc.clamp(0, 255) as u8;
        }
    }
    RgbPixel::new(out[0], out[1], out[2])
}
