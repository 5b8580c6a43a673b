//! Heater control implementations

pub mod phase_angle;
pub mod pid;

pub use phase_angle::PhaseAngleTable;
pub use pid::{ControllerState, PidConfig, PidController};
