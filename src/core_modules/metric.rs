// THEORY:
// The `metric` module reduces a neighbor window to a single unsigned
// sharpness figure: the sum of absolute differences between every window
// slot and the center pixel, per channel. 9 slots x 3 channels = 27 terms,
// one of which (center vs. center) is structurally zero. The whole thing
// is discrete integer arithmetic; identical inputs always produce the
// identical sum.
//
// A pixel counts as "in focus" only when the sum is STRICTLY greater than
// the configured threshold. Equality does not trigger a highlight, which
// also makes the all-ones threshold a guaranteed off switch.

use crate::core_modules::pixel::pixel::{MetricSum, Threshold};
use crate::core_modules::window::NeighborWindow;

/// Total deviation of the window from its center pixel.
pub fn sharpness(window: &NeighborWindow) -> MetricSum {
    let center = window.center();
    window.iter().map(|slot| center.deviation(&slot)).sum()
}

/// The highlight decision: strictly greater than, never equal.
pub fn exceeds(sum: MetricSum, threshold: Threshold) -> bool {
    sum > threshold as MetricSum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::window::DIM;

    fn uniform(p: Pixel) -> NeighborWindow {
        NeighborWindow {
            slots: [[p; DIM]; DIM],
        }
    }

    #[test]
    fn uniform_window_scores_zero() {
        assert_eq!(sharpness(&uniform(Pixel::new(77, 12, 250))), 0);
    }

    #[test]
    fn single_deviating_slot_contributes_its_channel_deltas() {
        let mut w = uniform(Pixel::BLACK);
        w.slots[0][2] = Pixel::new(10, 0, 5);
        assert_eq!(sharpness(&w), 15);
    }

    #[test]
    fn center_slot_contributes_nothing() {
        // Moving the center moves the reference: every OTHER slot now
        // deviates, but the center-vs-center term stays zero.
        let mut w = uniform(Pixel::BLACK);
        w.slots[1][1] = Pixel::new(1, 0, 0);
        assert_eq!(sharpness(&w), (DIM * DIM - 1) as MetricSum);
    }

    #[test]
    fn maximum_sum_fits_the_accumulator() {
        let mut w = uniform(Pixel::WHITE);
        w.slots[1][1] = Pixel::BLACK;
        // 8 non-center slots, 3 channels, 255 each.
        assert_eq!(sharpness(&w), 8 * 3 * 255);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        assert!(!exceeds(255, 255));
        assert!(exceeds(256, 255));
        assert!(!exceeds(0, 0));
        assert!(exceeds(1, 0));
        // Even the largest possible sum never exceeds the max threshold.
        assert!(!exceeds(27 * 255, u16::MAX));
    }
}
