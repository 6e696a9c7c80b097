// THEORY:
// This file is the main entry point for the `focus_peek` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API exposed to external consumers (test harnesses, tooling, the
// demo binary).
//
// The primary export is the `FocusPipeline`: a cycle-accurate model of a
// synchronous focus-peeking video filter, driven one clock cycle at a
// time through explicit ready/valid stream ports. Around it sit the
// collaborators the core deliberately does not own: the frame-driving
// harness, the parallel threshold-sweep pool, and the error type. The
// internal building blocks (`core_modules`) are exported too, since
// waveform and debug tooling legitimately wants to see them.

pub mod core_modules;
pub mod error;
pub mod harness;
pub mod parallel_pipeline;
pub mod pipeline;
