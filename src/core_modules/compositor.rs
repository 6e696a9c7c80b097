// THEORY:
// The `compositor` module is the last combinational stage: given the
// highlight decision it selects, per channel, between the (pipeline-
// delayed) original pixel and the configured highlight color. It also owns
// `RasterPosition`, the (x, y) scan-order coordinate tracked independently
// on the input side and the output side. Output-side markers are never
// taken on faith: `line_last` and `frame_last` are regenerated purely from
// the output raster position at the moment of the transfer.

use crate::core_modules::pixel::pixel::Pixel;

/// Selects the output pixel channel-by-channel. Both arms come from the
/// same decision bit, so this collapses to a whole-pixel select.
pub fn compose(original: Pixel, highlight: Pixel, in_focus: bool) -> Pixel {
    if in_focus { highlight } else { original }
}

/// A scan-order coordinate: x fastest-varying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterPosition {
    pub x: u32,
    pub y: u32,
}

impl RasterPosition {
    /// Input-side advance: follows the producer's markers.
    pub fn advance_with_markers(self, line_last: bool, frame_last: bool) -> Self {
        if !line_last {
            Self {
                x: self.x + 1,
                y: self.y,
            }
        } else if !frame_last {
            Self {
                x: 0,
                y: self.y + 1,
            }
        } else {
            Self { x: 0, y: 0 }
        }
    }

    /// Output-side advance: derived from the configured geometry alone.
    pub fn advance(self, width: u32, height: u32) -> Self {
        if self.x < width - 1 {
            Self {
                x: self.x + 1,
                y: self.y,
            }
        } else if self.y < height - 1 {
            Self {
                x: 0,
                y: self.y + 1,
            }
        } else {
            Self { x: 0, y: 0 }
        }
    }

    pub fn at_line_end(&self, width: u32) -> bool {
        self.x == width - 1
    }

    pub fn at_frame_end(&self, width: u32, height: u32) -> bool {
        self.at_line_end(width) && self.y == height - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_selects_between_original_and_highlight() {
        let original = Pixel::new(10, 20, 30);
        let highlight = Pixel::new(255, 0, 0);
        assert_eq!(compose(original, highlight, false), original);
        assert_eq!(compose(original, highlight, true), highlight);
    }

    #[test]
    fn output_position_wraps_line_and_frame() {
        let mut pos = RasterPosition::default();
        let (w, h) = (3, 2);
        let mut trace = Vec::new();
        for _ in 0..(w * h) {
            trace.push((pos.x, pos.y, pos.at_line_end(w), pos.at_frame_end(w, h)));
            pos = pos.advance(w, h);
        }
        assert_eq!(
            trace,
            vec![
                (0, 0, false, false),
                (1, 0, false, false),
                (2, 0, true, false),
                (0, 1, false, false),
                (1, 1, false, false),
                (2, 1, true, true),
            ]
        );
        // Frame completion wraps both coordinates.
        assert_eq!(pos, RasterPosition::default());
    }

    #[test]
    fn input_position_follows_markers() {
        let pos = RasterPosition { x: 4, y: 1 };
        assert_eq!(
            pos.advance_with_markers(false, false),
            RasterPosition { x: 5, y: 1 }
        );
        assert_eq!(
            pos.advance_with_markers(true, false),
            RasterPosition { x: 0, y: 2 }
        );
        assert_eq!(
            pos.advance_with_markers(true, true),
            RasterPosition::default()
        );
    }
}
