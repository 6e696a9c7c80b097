//! The single, unified error type for the crate.
//!
//! The pipeline itself is closed, total, deterministic logic: handshake
//! stalls are ordinary and signaled through the `ready`/`valid` booleans,
//! never through this type. What remains are construction-time
//! configuration mistakes and the two fatal internal-consistency faults
//! that must never be swallowed.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The requested geometry or configuration cannot form a valid pipeline.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A computed line-store address fell outside [0, capacity).
    /// Cannot occur under masked addressing; if detected, the simulated
    /// state can no longer be trusted and the run must abort.
    #[error("line store address {address} outside [0, {capacity})")]
    AddressFault { address: usize, capacity: usize },

    /// At output `frame_last`, the number of output transfers for the frame
    /// did not match the number of input transfers consumed for it. A
    /// violation of the flow-control contract, surfaced as a hard failure.
    #[error("pixel count mismatch at frame end: consumed {consumed} input transfers, produced {produced} output transfers")]
    PixelCountMismatch { consumed: u64, produced: u64 },

    /// A sweep worker went away before delivering its result.
    #[error("sweep worker unavailable: {0}")]
    SweepWorker(String),
}
