// THEORY:
// The `stream` module defines the handshake contract used at both ends of
// the pipeline. A transfer happens iff `valid` and `ready` hold in the same
// cycle. The producer asserts `valid` without waiting for `ready`; the
// consumer may deassert `ready` at will; a stalled payload is simply
// re-presented on the next cycle. Nothing here is ever an error: stalls are
// the normal language of backpressure.
//
// `line_last` and `frame_last` ride alongside the payload and are only
// meaningful on cycles where a transfer actually occurs.

use crate::core_modules::pixel::pixel::Pixel;

/// The producer-driven half of the input boundary, sampled once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamInput {
    pub valid: bool,
    pub payload: Pixel,
    /// Marks the last pixel of a scan line (meaningful only on a transfer).
    pub line_last: bool,
    /// Marks the last pixel of a frame (meaningful only on a transfer).
    pub frame_last: bool,
}

impl StreamInput {
    /// A cycle on which the producer has nothing to offer.
    pub const fn idle() -> Self {
        Self {
            valid: false,
            payload: Pixel::BLACK,
            line_last: false,
            frame_last: false,
        }
    }

    pub const fn pixel(payload: Pixel, line_last: bool, frame_last: bool) -> Self {
        Self {
            valid: true,
            payload,
            line_last,
            frame_last,
        }
    }
}

/// The pipeline-driven half of the output boundary, sampled once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamOutput {
    pub valid: bool,
    pub payload: Pixel,
    pub line_last: bool,
    pub frame_last: bool,
}

/// A transfer is observed iff both sides agree in the same cycle.
pub const fn transfer(valid: bool, ready: bool) -> bool {
    valid && ready
}
