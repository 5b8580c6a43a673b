//! Safety monitor implementation
//!
//! Watches the supervisory task's reports for over-temperature and
//! sustained sensor loss. The caller turns a fault into
//! [`OvenController::abort`](crate::OvenController::abort).

use crate::config::SafetyConfig;
use crate::state::{OperatingMode, OvenError};
use crate::supervisor::{PollReport, SampleOutcome};

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Safety condition violated
    Fault(OvenError),
}

/// Safety monitor for fault detection
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    config: SafetyConfig,
    /// Last good temperature reading (°C)
    last_temperature_c: Option<f32>,
    /// Time of the last fresh sample, or of creation before the first one
    last_fresh_ms: u64,
    /// Sensor errors since the last good reading
    consecutive_errors: u8,
}

impl SafetyMonitor {
    /// Create a new safety monitor
    pub fn new(config: SafetyConfig, now_ms: u64) -> Self {
        Self {
            config,
            last_temperature_c: None,
            last_fresh_ms: now_ms,
            consecutive_errors: 0,
        }
    }

    /// Record what the supervisory task just did
    pub fn observe(&mut self, report: &PollReport, now_ms: u64) {
        match report.sample {
            Some(SampleOutcome::Updated { temperature_c, .. }) => {
                self.last_temperature_c = Some(temperature_c);
                self.last_fresh_ms = now_ms;
                self.consecutive_errors = 0;
            }
            Some(SampleOutcome::SensorError) => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
            }
            Some(SampleOutcome::NoFreshReading) | None => {}
        }
    }

    /// Check all safety conditions
    ///
    /// Over-temperature faults in any mode. Sensor loss only matters while
    /// a profile is running, so an idle oven with no thermocouple attached stays
    /// quiet.
    pub fn check(&self, now_ms: u64, mode: OperatingMode) -> SafetyStatus {
        if let Some(t) = self.last_temperature_c {
            if t > self.config.max_temperature_c {
                return SafetyStatus::Fault(OvenError::OverTemperature);
            }
        }

        if mode != OperatingMode::Reflow {
            return SafetyStatus::Ok;
        }

        if self.consecutive_errors >= self.config.max_sensor_errors {
            return SafetyStatus::Fault(OvenError::SensorFault);
        }

        let since_fresh = now_ms.saturating_sub(self.last_fresh_ms);
        if since_fresh > u64::from(self.config.sample_timeout_ms) {
            return SafetyStatus::Fault(OvenError::SensorStale);
        }

        SafetyStatus::Ok
    }

    /// Last good temperature reading (°C)
    pub fn temperature(&self) -> Option<f32> {
        self.last_temperature_c
    }

    /// Sensor errors since the last good reading
    pub fn consecutive_errors(&self) -> u8 {
        self.consecutive_errors
    }
}
