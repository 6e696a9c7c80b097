// THEORY:
// The `parallel_pipeline` module runs threshold sweeps: the same frame
// filtered at several thresholds at once, so a caller can preview how
// aggressive the peeking overlay gets before committing to a setting.
// The core pipeline is strictly single-threaded by design, so parallelism
// comes from instantiating it: a pool of workers, each owning its own
// `FrameDriver`, fed through a round-robin dispatcher. Determinism of the
// core makes the results independent of scheduling order.

use crate::error::PipelineError;
use crate::harness::{pixels_changed, FrameDriver};
use crate::pipeline::PipelineConfig;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// The result of filtering one frame at one threshold.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub threshold: u16,
    /// The filtered packed-RGB frame.
    pub frame: Vec<u8>,
    /// How many pixels the highlight replaced.
    pub highlighted: usize,
}

struct SweepTask {
    frame: Arc<Vec<u8>>,
    threshold: u16,
    result_sender: oneshot::Sender<Result<SweepOutcome, PipelineError>>,
}

/// A pool of pipeline workers for threshold sweeps over one geometry.
pub struct SweepPool {
    task_sender: mpsc::UnboundedSender<SweepTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl SweepPool {
    /// Spawns one worker per available core, each owning a pipeline built
    /// from `base` (the threshold is overridden per task).
    pub fn new(base: PipelineConfig) -> Self {
        let pool_size = num_cpus::get().max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<SweepTask>();
        let mut workers = Vec::new();

        // A single dispatcher distributes tasks round-robin.
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..pool_size)
            .map(|_| mpsc::unbounded_channel::<SweepTask>())
            .unzip();

        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % pool_size;
            }
        });

        for mut worker_receiver in worker_receivers {
            let worker_config = base.clone();

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result = Self::filter_at(&worker_config, &task.frame, task.threshold);
                    let _ = task.result_sender.send(result);
                }
            });

            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    fn filter_at(
        base: &PipelineConfig,
        frame: &[u8],
        threshold: u16,
    ) -> Result<SweepOutcome, PipelineError> {
        let config = PipelineConfig {
            threshold,
            ..base.clone()
        };
        let mut driver = FrameDriver::new(config)?;
        let filtered = driver.run_frame(frame)?;
        Ok(SweepOutcome {
            threshold,
            highlighted: pixels_changed(frame, &filtered),
            frame: filtered,
        })
    }

    /// Filters `frame` once per threshold and returns the outcomes in the
    /// same order as `thresholds`.
    pub async fn sweep(
        &self,
        frame: Vec<u8>,
        thresholds: &[u16],
    ) -> Result<Vec<SweepOutcome>, PipelineError> {
        let frame = Arc::new(frame);
        let mut receivers = Vec::with_capacity(thresholds.len());

        for &threshold in thresholds {
            let (result_sender, result_receiver) = oneshot::channel();
            let task = SweepTask {
                frame: Arc::clone(&frame),
                threshold,
                result_sender,
            };
            self.task_sender
                .send(task)
                .map_err(|_| PipelineError::SweepWorker("pool is shut down".into()))?;
            receivers.push(result_receiver);
        }

        let mut outcomes = Vec::with_capacity(receivers.len());
        for received in futures::future::join_all(receivers).await {
            let outcome =
                received.map_err(|_| PipelineError::SweepWorker("worker dropped task".into()))??;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn frame_with_spot(width: usize, height: usize) -> Vec<u8> {
        let mut frame = vec![0u8; width * height * 3];
        let center = (height / 2 * width + width / 2) * 3;
        frame[center] = 255;
        frame[center + 1] = 255;
        frame[center + 2] = 255;
        frame
    }

    #[tokio::test]
    async fn sweep_is_monotonic_in_threshold() {
        let config = PipelineConfig {
            width: 8,
            height: 8,
            highlight: Pixel::new(255, 0, 255),
            ..PipelineConfig::default()
        };
        let pool = SweepPool::new(config);
        let frame = frame_with_spot(8, 8);

        let outcomes = pool
            .sweep(frame, &[0, 200, u16::MAX])
            .await
            .expect("sweep failed");

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].threshold, 0);
        assert!(outcomes[0].highlighted >= outcomes[1].highlighted);
        assert!(outcomes[1].highlighted >= outcomes[2].highlighted);
        // Nothing can exceed the maximum representable threshold.
        assert_eq!(outcomes[2].highlighted, 0);
    }

    #[tokio::test]
    async fn pool_spawns_at_least_one_worker() {
        let pool = SweepPool::new(PipelineConfig {
            width: 4,
            height: 4,
            ..PipelineConfig::default()
        });
        assert!(pool.worker_count() >= 1);
    }
}
