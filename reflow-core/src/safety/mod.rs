//! Safety monitoring
//!
//! Detects over-temperature and sensor loss from the supervisory task's
//! reports.

pub mod monitor;

pub use monitor::{SafetyMonitor, SafetyStatus};
