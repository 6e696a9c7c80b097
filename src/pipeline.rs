// THEORY:
// The `pipeline` module is the top level of the cycle-accurate model. It
// owns every sequential element — the two line stores, the window shift
// chain, both raster positions, the skew counter — and turns the crank
// once per clock cycle in two strictly separated phases:
//
//   1. `evaluate`: purely combinational. Reads ONLY previous-cycle
//      committed state plus the live boundary signals, and produces this
//      cycle's view of every output port.
//   2. `rising_edge`: stages every register update implied by that view,
//      then commits them all at one atomic point. No computation inside a
//      cycle can ever observe a write made earlier in the same cycle.
//
// The configuration (geometry, threshold, highlight color, skew policy) is
// immutable after construction; there is no way to race a configuration
// change against in-flight pixels.

use crate::core_modules::compositor::{self, RasterPosition};
use crate::core_modules::line_store::LineDelayStore;
use crate::core_modules::metric;
use crate::core_modules::pixel::pixel::{MetricSum, Pixel, Threshold};
use crate::core_modules::skew::{FlowState, SkewController};
use crate::core_modules::stream::{transfer, StreamInput, StreamOutput};
use crate::core_modules::sync::Reg;
use crate::core_modules::window::{self, WindowAssembler};
use crate::error::PipelineError;
use log::debug;
use std::collections::VecDeque;

// Re-export key data structures for the public API.
pub use crate::core_modules::pixel::pixel::Pixel as PixelSample;
pub use crate::core_modules::skew::FlowState as PipelineFlowState;

/// What happens to the skew counter when an output `frame_last` transfer
/// completes a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkewPolicy {
    /// Carry residual skew into the next frame. Correct for back-to-back
    /// streaming, where the next frame's pixels flush out the current one.
    #[default]
    Carry,
    /// Force the counter to zero so the next frame refills from scratch.
    /// For callers that feed independent documents (and reset between them).
    ResetBetweenFrames,
}

/// Configuration for the pipeline, fixed at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    /// Metric sums strictly greater than this are highlighted.
    pub threshold: Threshold,
    /// The color substituted for in-focus pixels.
    pub highlight: Pixel,
    pub skew_policy: SkewPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            threshold: 255,
            highlight: Pixel::new(255, 0, 0),
            skew_policy: SkewPolicy::default(),
        }
    }
}

/// Everything the pipeline drives during one cycle, as seen at the
/// boundary plus the two handshake outcomes and the raw metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleView {
    /// Backpressure to the producer.
    pub in_ready: bool,
    pub out: StreamOutput,
    pub input_transfer: bool,
    pub output_transfer: bool,
    pub metric: MetricSum,
    pub in_focus: bool,
}

/// Classification of an exported signal, for waveform/debug tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Input,
    Output,
    Sync,
    Comb,
}

/// One named internal signal with its committed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalProbe {
    pub name: String,
    pub bits: u32,
    pub value: u64,
    pub kind: SignalKind,
}

/// The complete synchronous focus-peeking pipeline.
pub struct FocusPipeline {
    config: PipelineConfig,
    line_above: LineDelayStore,
    line_two_above: LineDelayStore,
    window: WindowAssembler,
    skew: SkewController,
    in_pos: Reg<RasterPosition>,
    out_pos: Reg<RasterPosition>,
    /// Input transfers accepted so far for the input-side frame in flight.
    in_frame_transfers: u64,
    /// Transfer counts of input frames whose `frame_last` has been
    /// accepted but whose output `frame_last` has not yet been produced.
    completed_input_frames: VecDeque<u64>,
    /// Output transfers produced so far for the output-side frame in flight.
    out_frame_transfers: u64,
}

impl FocusPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let reach = window::REACH as u32;
        if config.width < window::DIM as u32 {
            return Err(PipelineError::InvalidConfig(format!(
                "frame width {} cannot host a {}x{} window",
                config.width,
                window::DIM,
                window::DIM
            )));
        }
        if config.height < window::DIM as u32 {
            return Err(PipelineError::InvalidConfig(format!(
                "frame height {} cannot host a {}x{} window",
                config.height,
                window::DIM,
                window::DIM
            )));
        }
        let latency = reach + config.width * reach;
        let width = config.width as usize;
        Ok(Self {
            line_above: LineDelayStore::new(width),
            line_two_above: LineDelayStore::new(width),
            window: WindowAssembler::new(),
            skew: SkewController::new(latency),
            in_pos: Reg::default(),
            out_pos: Reg::default(),
            in_frame_transfers: 0,
            completed_input_frames: VecDeque::new(),
            out_frame_transfers: 0,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fixed latency L in accepted pixels: one column plus one full line.
    pub fn latency(&self) -> u32 {
        self.skew.latency()
    }

    pub fn flow_state(&self) -> FlowState {
        self.skew.state()
    }

    pub fn skew(&self) -> u32 {
        self.skew.count()
    }

    /// Synchronous reset: zeroes every register, counter and store cell.
    pub fn reset(&mut self) {
        self.line_above.clear();
        self.line_two_above.clear();
        self.window.clear();
        self.skew.clear();
        self.in_pos.load(RasterPosition::default());
        self.out_pos.load(RasterPosition::default());
        self.in_frame_transfers = 0;
        self.completed_input_frames.clear();
        self.out_frame_transfers = 0;
    }

    /// The combinational half of a cycle. Reads only committed state and
    /// the live boundary signals; drives nothing.
    pub fn evaluate(&self, input: &StreamInput, out_ready: bool) -> CycleView {
        let (in_ready, out_valid) = self.skew.gate(input.valid, out_ready);
        let input_transfer = transfer(input.valid, in_ready);
        let output_transfer = transfer(out_valid, out_ready);

        let neighborhood = self.window.window(
            input.payload,
            self.line_above.read_data(),
            self.line_two_above.read_data(),
        );
        let metric = metric::sharpness(&neighborhood);
        let in_focus = metric::exceeds(metric, self.config.threshold);
        let payload = compositor::compose(neighborhood.center(), self.config.highlight, in_focus);

        let out_pos = self.out_pos.get();
        let line_last = output_transfer && out_pos.at_line_end(self.config.width);
        let frame_last =
            line_last && out_pos.at_frame_end(self.config.width, self.config.height);

        CycleView {
            in_ready,
            out: StreamOutput {
                valid: out_valid,
                payload,
                line_last,
                frame_last,
            },
            input_transfer,
            output_transfer,
            metric,
            in_focus,
        }
    }

    /// One full clock cycle: evaluate, stage every register update, then
    /// commit them all atomically. Returns the cycle's boundary view, or a
    /// fatal fault if the cycle uncovered an internal inconsistency.
    pub fn rising_edge(
        &mut self,
        input: &StreamInput,
        out_ready: bool,
    ) -> Result<CycleView, PipelineError> {
        let view = self.evaluate(input, out_ready);
        let in_pos = self.in_pos.get();

        // The read address leads the write address by one pixel so the read
        // register lands on the neighbor above the NEXT pixel in. Reads are
        // sampled before this cycle's writes are applied.
        let read_x = if view.input_transfer {
            (in_pos.x + 1) % self.config.width
        } else {
            in_pos.x
        };
        self.line_above.sample(read_x as usize)?;
        self.line_two_above.sample(read_x as usize)?;

        if view.input_transfer {
            let write_x = in_pos.x as usize;
            // The second store is chained off the first store's read
            // register, putting it one further line behind.
            let chained = self.line_above.read_data();
            self.line_above.write(write_x, input.payload)?;
            self.line_two_above.write(write_x, chained)?;

            self.window.shift(
                input.payload,
                self.line_above.read_data(),
                self.line_two_above.read_data(),
            );
            self.in_pos
                .drive(in_pos.advance_with_markers(input.line_last, input.frame_last));

            self.in_frame_transfers += 1;
            if input.frame_last {
                self.completed_input_frames
                    .push_back(self.in_frame_transfers);
                self.in_frame_transfers = 0;
            }
        }

        self.skew.observe(view.input_transfer, view.output_transfer);

        let mut frame_fault = None;
        if view.output_transfer {
            self.out_pos.drive(
                self.out_pos
                    .get()
                    .advance(self.config.width, self.config.height),
            );
            self.out_frame_transfers += 1;

            if view.out.frame_last {
                let produced = self.out_frame_transfers;
                self.out_frame_transfers = 0;
                let consumed = self.completed_input_frames.pop_front().unwrap_or(0);
                if consumed != produced {
                    frame_fault = Some(PipelineError::PixelCountMismatch { consumed, produced });
                } else {
                    debug!("frame complete: {} transfers each way", produced);
                }
                if self.config.skew_policy == SkewPolicy::ResetBetweenFrames {
                    self.skew.force_empty();
                }
            }
        }

        // The atomic commit point: every staged value becomes current.
        self.line_above.commit();
        self.line_two_above.commit();
        self.window.commit();
        self.skew.commit();
        self.in_pos.commit();
        self.out_pos.commit();

        match frame_fault {
            Some(fault) => Err(fault),
            None => Ok(view),
        }
    }

    /// Named-signal export for waveform/debug tooling: every internal
    /// register with its committed value and classification. The stream
    /// ports themselves appear in each cycle's `CycleView`.
    pub fn probes(&self) -> Vec<SignalProbe> {
        let pos_bits = bits_for(self.config.width.max(self.config.height) - 1);
        let mut probes = vec![
            probe("threshold", 16, self.config.threshold as u64, SignalKind::Input),
            probe(
                "highlight",
                24,
                self.config.highlight.pack() as u64,
                SignalKind::Input,
            ),
            probe("input_x", pos_bits, self.in_pos.get().x as u64, SignalKind::Sync),
            probe("input_y", pos_bits, self.in_pos.get().y as u64, SignalKind::Sync),
            probe("output_x", pos_bits, self.out_pos.get().x as u64, SignalKind::Sync),
            probe("output_y", pos_bits, self.out_pos.get().y as u64, SignalKind::Sync),
            probe(
                "delayed_cycles",
                bits_for(self.latency() + 1),
                self.skew.count() as u64,
                SignalKind::Sync,
            ),
            probe(
                "line_above_r_data",
                24,
                self.line_above.read_data().pack() as u64,
                SignalKind::Sync,
            ),
            probe(
                "line_two_above_r_data",
                24,
                self.line_two_above.read_data().pack() as u64,
                SignalKind::Sync,
            ),
        ];
        for (x, y, pixel) in self.window.taps() {
            probes.push(probe(
                &format!("window_tap_{x}_{y}"),
                24,
                pixel.pack() as u64,
                SignalKind::Sync,
            ));
        }
        probes
    }

    /// Read-only view of a line store's contents, for tracing.
    pub fn line_store_contents(&self, lines_above: usize) -> Option<&[Pixel]> {
        match lines_above {
            1 => Some(self.line_above.contents()),
            2 => Some(self.line_two_above.contents()),
            _ => None,
        }
    }
}

fn probe(name: &str, bits: u32, value: u64, kind: SignalKind) -> SignalProbe {
    SignalProbe {
        name: name.to_string(),
        bits,
        value,
        kind,
    }
}

fn bits_for(max_value: u32) -> u32 {
    (u32::BITS - max_value.leading_zeros()).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_4x4() -> PipelineConfig {
        PipelineConfig {
            width: 4,
            height: 4,
            threshold: 0,
            highlight: Pixel::new(255, 0, 0),
            skew_policy: SkewPolicy::Carry,
        }
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let cfg = PipelineConfig {
            width: 2,
            ..config_4x4()
        };
        assert!(matches!(
            FocusPipeline::new(cfg),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn latency_is_one_line_plus_one_pixel() {
        let pipeline = FocusPipeline::new(config_4x4()).unwrap();
        assert_eq!(pipeline.latency(), 5);
    }

    #[test]
    fn fill_phase_accepts_unconditionally_and_stays_silent() {
        let mut pipeline = FocusPipeline::new(config_4x4()).unwrap();
        let latency = pipeline.latency();
        for i in 0..latency {
            assert_eq!(pipeline.flow_state(), FlowState::Filling);
            let input = StreamInput::pixel(Pixel::BLACK, (i + 1) % 4 == 0, false);
            // Output-side ready is LOW; fill must not care.
            let view = pipeline.rising_edge(&input, false).unwrap();
            assert!(view.in_ready);
            assert!(!view.out.valid);
            assert!(view.input_transfer);
        }
        assert_eq!(pipeline.flow_state(), FlowState::SteadyState);
    }

    #[test]
    fn steady_state_passes_flow_control_through() {
        let mut pipeline = FocusPipeline::new(config_4x4()).unwrap();
        for i in 0..pipeline.latency() {
            let input = StreamInput::pixel(Pixel::BLACK, (i + 1) % 4 == 0, false);
            pipeline.rising_edge(&input, true).unwrap();
        }
        // in.ready mirrors out.ready, out.valid mirrors in.valid.
        let valid = StreamInput::pixel(Pixel::BLACK, false, false);
        let view = pipeline.evaluate(&valid, true);
        assert!(view.in_ready && view.out.valid);
        let view = pipeline.evaluate(&valid, false);
        assert!(!view.in_ready && view.out.valid);
        let view = pipeline.evaluate(&StreamInput::idle(), true);
        assert!(view.in_ready && !view.out.valid);
    }

    #[test]
    fn stalled_input_changes_nothing() {
        let mut pipeline = FocusPipeline::new(config_4x4()).unwrap();
        let before = pipeline.probes();
        let view = pipeline.rising_edge(&StreamInput::idle(), false).unwrap();
        assert!(!view.input_transfer && !view.output_transfer);
        assert_eq!(pipeline.probes(), before);
    }

    #[test]
    fn probes_classify_config_as_inputs_and_registers_as_sync() {
        let pipeline = FocusPipeline::new(config_4x4()).unwrap();
        let probes = pipeline.probes();
        let threshold = probes.iter().find(|p| p.name == "threshold").unwrap();
        assert_eq!(threshold.kind, SignalKind::Input);
        let skew = probes.iter().find(|p| p.name == "delayed_cycles").unwrap();
        assert_eq!(skew.kind, SignalKind::Sync);
        // Six delay taps exported alongside the scalar registers.
        assert_eq!(
            probes.iter().filter(|p| p.name.starts_with("window_tap")).count(),
            6
        );
    }
}
