// THEORY:
// The `window` module assembles the 3x3 neighborhood the metric engine
// works on. Three pixels arrive "for free" each accepted cycle: the live
// input payload (current line) and the two line-store read registers (one
// and two lines up). Behind each of those sits a chain of two one-cycle
// delay registers, advanced only on accepted input transfers. Column 0 of
// the window is therefore the newest pixel of each row, column 1 is one
// pixel back, column 2 is two pixels back — and slot (1,1) is the pixel
// the pipeline is currently producing a decision for.
//
// The window deliberately contains all 9 slots, including the center
// itself. Downstream the center-vs-center comparison contributes zero;
// it is kept because the window is a complete 3x3 structure, not a
// hand-trimmed list of 8 neighbors.

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::sync::Reg;

/// Window columns / rows per side. The window is `DIM` x `DIM`.
pub const DIM: usize = 3;
/// How far the window reaches left of / above the center pixel.
pub const REACH: usize = 1;

/// An ordered 3x3 block of samples. `slots[x][y]`: x counts pixels back in
/// raster order (0 = newest), y counts lines up (0 = current line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborWindow {
    pub slots: [[Pixel; DIM]; DIM],
}

impl NeighborWindow {
    /// The pixel this window is centered on.
    pub fn center(&self) -> Pixel {
        self.slots[REACH][REACH]
    }

    pub fn iter(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.slots.iter().flat_map(|column| column.iter().copied())
    }
}

/// The shift chain: two delay columns behind the three live taps.
pub struct WindowAssembler {
    /// `delayed[x - 1][y]` holds the window slot (x, y) for x in {1, 2}.
    delayed: [[Reg<Pixel>; DIM]; DIM - 1],
}

impl WindowAssembler {
    pub fn new() -> Self {
        Self {
            delayed: Default::default(),
        }
    }

    /// Forms the window from previous-cycle register state plus the three
    /// live taps. Purely combinational.
    pub fn window(&self, live: Pixel, one_line_up: Pixel, two_lines_up: Pixel) -> NeighborWindow {
        let mut slots = [[Pixel::BLACK; DIM]; DIM];
        slots[0] = [live, one_line_up, two_lines_up];
        for x in 1..DIM {
            for y in 0..DIM {
                slots[x][y] = self.delayed[x - 1][y].get();
            }
        }
        NeighborWindow { slots }
    }

    /// Advances the chain by one accepted pixel: column 1 takes the live
    /// taps, column 2 takes column 1's previous values.
    pub fn shift(&mut self, live: Pixel, one_line_up: Pixel, two_lines_up: Pixel) {
        let fresh = [live, one_line_up, two_lines_up];
        for y in 0..DIM {
            let carried = self.delayed[0][y].get();
            self.delayed[0][y].drive(fresh[y]);
            self.delayed[1][y].drive(carried);
        }
    }

    pub fn commit(&mut self) {
        for column in self.delayed.iter_mut() {
            for reg in column.iter_mut() {
                reg.commit();
            }
        }
    }

    pub fn clear(&mut self) {
        for column in self.delayed.iter_mut() {
            for reg in column.iter_mut() {
                reg.load(Pixel::BLACK);
            }
        }
    }

    /// Current register values for tracing: `(x, y, pixel)` per delay slot.
    pub fn taps(&self) -> impl Iterator<Item = (usize, usize, Pixel)> + '_ {
        self.delayed.iter().enumerate().flat_map(|(i, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(y, reg)| (i + 1, y, reg.get()))
        })
    }
}

impl Default for WindowAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(v: u8) -> Pixel {
        Pixel::new(v, v, v)
    }

    #[test]
    fn shift_chain_delays_by_one_and_two_cycles() {
        let mut asm = WindowAssembler::new();
        asm.shift(px(1), px(10), px(100));
        asm.commit();
        asm.shift(px(2), px(20), px(200));
        asm.commit();

        let w = asm.window(px(3), px(30), px(255));
        // Column 0: live taps of this cycle.
        assert_eq!(w.slots[0], [px(3), px(30), px(255)]);
        // Column 1: taps from one accepted cycle ago.
        assert_eq!(w.slots[1], [px(2), px(20), px(200)]);
        // Column 2: taps from two accepted cycles ago.
        assert_eq!(w.slots[2], [px(1), px(10), px(100)]);
        assert_eq!(w.center(), px(20));
    }

    #[test]
    fn stalled_cycles_do_not_advance_the_chain() {
        let mut asm = WindowAssembler::new();
        asm.shift(px(1), px(1), px(1));
        asm.commit();
        // A cycle without an accepted transfer commits but never shifts.
        asm.commit();
        let w = asm.window(px(9), px(9), px(9));
        assert_eq!(w.slots[1], [px(1), px(1), px(1)]);
        assert_eq!(w.slots[2], [Pixel::BLACK; DIM]);
    }

    #[test]
    fn window_has_nine_slots_including_center() {
        let asm = WindowAssembler::new();
        let w = asm.window(px(5), px(5), px(5));
        assert_eq!(w.iter().count(), DIM * DIM);
    }
}
