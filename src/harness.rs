// THEORY:
// The `harness` module is the outer control loop the pipeline itself
// refuses to own: it toggles the clock, presents input transactions with
// correctly derived line/frame markers, honors backpressure, and collects
// output transfers. The demo binary, the sweep pool and the integration
// tests all drive frames through this one loop.
//
// Key architectural principles:
// 1.  **The contract, obeyed**: a stalled payload is re-presented until it
//     is accepted; `out.ready` may drop at any time; no pixel is ever
//     dropped or duplicated by the driver.
// 2.  **Flushing**: the pipeline always holds its fixed latency of pixels.
//     After the last real frame, the driver feeds a phantom black frame so
//     the tail drains; phantom pixels are never collected.
// 3.  **Stall patterns**: deterministic, cycle-indexed deassertions of
//     `in.valid` and `out.ready`, so backpressure runs are reproducible
//     bit for bit.

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::stream::StreamInput;
use crate::error::PipelineError;
use crate::pipeline::{FocusPipeline, PipelineConfig, SkewPolicy};
use log::debug;

/// A deterministic, cycle-indexed handshake stall schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StallPattern {
    /// Never stall.
    #[default]
    None,
    /// Deassert on every cycle where `cycle % n == 0`. Periods below 2
    /// would stall forever and are treated as 2.
    EveryNth(u64),
}

impl StallPattern {
    fn allows(&self, cycle: u64) -> bool {
        match *self {
            StallPattern::None => true,
            StallPattern::EveryNth(n) => cycle % n.max(2) != 0,
        }
    }
}

/// Drives complete frames through a pipeline, cycle by cycle.
pub struct FrameDriver {
    pipeline: FocusPipeline,
    in_stall: StallPattern,
    out_stall: StallPattern,
    cycle: u64,
}

impl FrameDriver {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            pipeline: FocusPipeline::new(config)?,
            in_stall: StallPattern::None,
            out_stall: StallPattern::None,
            cycle: 0,
        })
    }

    /// Applies stall schedules to the producer and consumer sides.
    pub fn with_stalls(mut self, in_stall: StallPattern, out_stall: StallPattern) -> Self {
        self.in_stall = in_stall;
        self.out_stall = out_stall;
        self
    }

    pub fn pipeline(&self) -> &FocusPipeline {
        &self.pipeline
    }

    /// Resets the pipeline and runs a single packed-RGB frame through it,
    /// returning the filtered frame.
    pub fn run_frame(&mut self, rgb: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let mut frames = self.run_frames(&[rgb])?;
        Ok(frames.remove(0))
    }

    /// Resets the pipeline and streams several frames back to back,
    /// returning one filtered buffer per input frame. Back-to-back
    /// streaming relies on residual skew carrying across frame boundaries.
    pub fn run_frames(&mut self, frames: &[&[u8]]) -> Result<Vec<Vec<u8>>, PipelineError> {
        let width = self.pipeline.config().width as usize;
        let height = self.pipeline.config().height as usize;
        let frame_pixels = width * height;
        for (i, frame) in frames.iter().enumerate() {
            if frame.len() != frame_pixels * 3 {
                return Err(PipelineError::InvalidConfig(format!(
                    "frame {} holds {} bytes, geometry {}x{} needs {}",
                    i,
                    frame.len(),
                    width,
                    height,
                    frame_pixels * 3
                )));
            }
        }
        if frames.len() > 1
            && self.pipeline.config().skew_policy == SkewPolicy::ResetBetweenFrames
        {
            return Err(PipelineError::InvalidConfig(
                "back-to-back frames require SkewPolicy::Carry".into(),
            ));
        }

        self.pipeline.reset();
        self.cycle = 0;

        let total_wanted = frame_pixels * frames.len();
        let mut outputs: Vec<Vec<u8>> = frames
            .iter()
            .map(|_| Vec::with_capacity(frame_pixels * 3))
            .collect();
        let mut fed = 0usize;
        let mut produced = 0usize;

        while produced < total_wanted {
            let x = fed % width;
            let y = (fed / width) % height;
            let payload = if fed < total_wanted {
                let frame = frames[fed / frame_pixels];
                let base = (fed % frame_pixels) * 3;
                Pixel::new(frame[base], frame[base + 1], frame[base + 2])
            } else {
                // Phantom flush frame: content is irrelevant, markers are not.
                Pixel::BLACK
            };
            let line_last = x == width - 1;
            let frame_last = line_last && y == height - 1;

            let input = if self.in_stall.allows(self.cycle) {
                StreamInput::pixel(payload, line_last, frame_last)
            } else {
                StreamInput::idle()
            };
            let out_ready = self.out_stall.allows(self.cycle);

            let view = self.pipeline.rising_edge(&input, out_ready)?;
            self.cycle += 1;

            if view.input_transfer {
                fed += 1;
            }
            if view.output_transfer {
                if produced < total_wanted {
                    let out = &mut outputs[produced / frame_pixels];
                    out.push(view.out.payload.red);
                    out.push(view.out.payload.green);
                    out.push(view.out.payload.blue);
                }
                produced += 1;
            }
        }

        debug!(
            "streamed {} frame(s) of {}x{} in {} cycles",
            frames.len(),
            width,
            height,
            self.cycle
        );
        Ok(outputs)
    }
}

/// How many pixels differ between two same-sized packed-RGB buffers.
pub fn pixels_changed(a: &[u8], b: &[u8]) -> usize {
    a.chunks_exact(3)
        .zip(b.chunks_exact(3))
        .filter(|(x, y)| x != y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_patterns_are_periodic_and_never_total() {
        let p = StallPattern::EveryNth(3);
        assert!(!p.allows(0));
        assert!(p.allows(1));
        assert!(p.allows(2));
        assert!(!p.allows(3));
        // A degenerate period still lets every other cycle through.
        let p = StallPattern::EveryNth(1);
        assert!(p.allows(1));
        assert!(!p.allows(2));
    }

    #[test]
    fn rejects_wrongly_sized_frames() {
        let config = PipelineConfig {
            width: 4,
            height: 4,
            ..PipelineConfig::default()
        };
        let mut driver = FrameDriver::new(config).unwrap();
        assert!(matches!(
            driver.run_frame(&[0u8; 5]),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn counts_changed_pixels() {
        let a = [0, 0, 0, 1, 1, 1];
        let b = [0, 0, 0, 1, 2, 1];
        assert_eq!(pixels_changed(&a, &b), 1);
    }
}
