//! Firing pipeline
//!
//! Turns the published controller output into a per-half-cycle firing
//! window and hands it to a [`reflow_hal::PhaseTimer`].

pub mod pipeline;

pub use pipeline::{firing_window, ArmError, FiringPipeline};
