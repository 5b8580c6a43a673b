//! Supervisory task
//!
//! Runs the temperature sampling and profile evaluation duties on their
//! own cadences.

pub mod task;

pub use task::{PollReport, SampleOutcome, SupervisoryTask};
