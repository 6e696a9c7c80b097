// THEORY:
// The `skew` module is the flow controller: one bounded counter tracking
// how many input pixels have been accepted ahead of the output pixels
// produced. It is the single source of truth for the pipeline's fill
// level, and it alone decides the ready/valid gating at both boundaries.
//
// With the 3x3 window the pipeline must run one full line plus one pixel
// ahead of its output before the "row above / row below" relationship
// means anything, so the steady-state skew L is `width + 1`. Three
// regimes fall out of comparing the counter to L:
//   - Filling (skew < L): accept everything, emit nothing.
//   - SteadyState (skew == L): a fixed-latency pass-through; input ready
//     mirrors output ready, output valid mirrors input valid.
//   - Draining (skew > L): stop accepting, emit until back at L.
// There is no explicit transition event; the comparison is simply
// re-evaluated against the committed counter every cycle.

use crate::core_modules::sync::Reg;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Filling,
    SteadyState,
    Draining,
}

pub struct SkewController {
    latency: u32,
    count: Reg<u32>,
}

impl SkewController {
    pub fn new(latency: u32) -> Self {
        Self {
            latency,
            count: Reg::new(0),
        }
    }

    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// The committed counter value.
    pub fn count(&self) -> u32 {
        self.count.get()
    }

    pub fn state(&self) -> FlowState {
        match self.count.get().cmp(&self.latency) {
            std::cmp::Ordering::Less => FlowState::Filling,
            std::cmp::Ordering::Equal => FlowState::SteadyState,
            std::cmp::Ordering::Greater => FlowState::Draining,
        }
    }

    /// Computes this cycle's `(in_ready, out_valid)` gating from the
    /// committed state and the live boundary signals.
    pub fn gate(&self, in_valid: bool, out_ready: bool) -> (bool, bool) {
        match self.state() {
            FlowState::Filling => (true, false),
            FlowState::Draining => (false, true),
            FlowState::SteadyState => (out_ready, in_valid),
        }
    }

    /// Records this cycle's handshake outcome: +1 for an input-only
    /// transfer, -1 for an output-only transfer, unchanged otherwise.
    pub fn observe(&mut self, input_transfer: bool, output_transfer: bool) {
        let count = self.count.get();
        if input_transfer && !output_transfer {
            self.count.drive(count + 1);
        } else if output_transfer && !input_transfer {
            self.count.drive(count.saturating_sub(1));
        }
    }

    /// Frame-boundary reset requested by the skew policy. Overrides
    /// whatever `observe` staged this cycle.
    pub fn force_empty(&mut self) {
        self.count.drive(0);
    }

    pub fn commit(&mut self) {
        let before = self.state();
        self.count.commit();
        let after = self.state();
        if before != after {
            debug!(
                "flow state {:?} -> {:?} (skew {} of {})",
                before,
                after,
                self.count.get(),
                self.latency
            );
        }
    }

    pub fn clear(&mut self) {
        self.count.load(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_then_reaches_steady_state() {
        let mut skew = SkewController::new(3);
        for _ in 0..3 {
            assert_eq!(skew.state(), FlowState::Filling);
            let (in_ready, out_valid) = skew.gate(true, false);
            assert!(in_ready);
            assert!(!out_valid);
            skew.observe(true, false);
            skew.commit();
        }
        assert_eq!(skew.state(), FlowState::SteadyState);
    }

    #[test]
    fn steady_state_mirrors_the_opposite_side() {
        let mut skew = SkewController::new(1);
        skew.observe(true, false);
        skew.commit();
        assert_eq!(skew.gate(true, true), (true, true));
        assert_eq!(skew.gate(true, false), (false, true));
        assert_eq!(skew.gate(false, true), (true, false));
        assert_eq!(skew.gate(false, false), (false, false));
    }

    #[test]
    fn drains_back_to_steady_state() {
        let mut skew = SkewController::new(1);
        skew.observe(true, false);
        skew.commit();
        skew.observe(true, false);
        skew.commit();
        assert_eq!(skew.state(), FlowState::Draining);
        let (in_ready, out_valid) = skew.gate(true, true);
        assert!(!in_ready);
        assert!(out_valid);
        skew.observe(false, true);
        skew.commit();
        assert_eq!(skew.state(), FlowState::SteadyState);
    }

    #[test]
    fn simultaneous_transfers_hold_the_counter() {
        let mut skew = SkewController::new(2);
        skew.observe(true, true);
        skew.commit();
        assert_eq!(skew.count(), 0);
        skew.observe(false, false);
        skew.commit();
        assert_eq!(skew.count(), 0);
    }

    #[test]
    fn force_empty_wins_over_observe() {
        let mut skew = SkewController::new(1);
        skew.observe(true, false);
        skew.commit();
        skew.observe(true, false);
        skew.force_empty();
        skew.commit();
        assert_eq!(skew.count(), 0);
    }
}
