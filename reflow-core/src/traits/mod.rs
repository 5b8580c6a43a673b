//! Collaborator traits
//!
//! These traits define the interface between the control core and the
//! sensor, feedback controller and compensation implementations.

pub mod control;
pub mod sensor;

pub use control::{Compensation, FeedbackController};
pub use sensor::{SensorStatus, ThermocoupleSensor};
