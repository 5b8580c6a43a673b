//! Configuration type definitions
//!
//! These types describe one oven: its firing timing, the feedback gains,
//! the safety limits and the profile to run.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::timing::TimingConfig;
use crate::profile::Profile;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Half-cycle width is zero
    ZeroHalfCycle,
    /// Timer clock is zero
    ZeroTimerClock,
    /// Phase angle limits are inverted or exceed the half-cycle
    PhaseAngleRange,
    /// Latch pulse rounds down to zero timer ticks
    LatchTooShort,
    /// Latch pulse would run past the next zero-crossing
    LatchExceedsMinAngle,
    /// Deskew delay is as long as a half-cycle
    DeskewTooLong,
    /// A half-cycle holds more ticks than the phase timer can count
    TickRangeExceeded,
    /// Sampling interval below the 100 ms floor
    SampleIntervalTooShort,
    /// State evaluation interval below the 500 ms floor
    StateIntervalTooShort,
    /// A gain or limit is negative or not finite
    InvalidGain,
    /// Safety limit is not usable
    InvalidSafetyLimit,
    /// Profile segment target is not a finite temperature
    InvalidSegment,
    /// Profile holds more segments than fit
    TooManySegments,
}

/// Feedback controller gains
///
/// Output units are microseconds of conduction per half-cycle, so the
/// proportional gain reads as "µs per °C of error".
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidGains {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain (per second)
    pub ki: f32,
    /// Derivative gain (seconds)
    pub kd: f32,
    /// Anti-windup clamp for the integral accumulator
    pub integral_cap: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 150.0,
            ki: 2.0,
            kd: 40.0,
            integral_cap: 2_000.0,
        }
    }
}

impl PidGains {
    /// Check that every gain is a finite, non-negative number
    pub fn validate(&self) -> Result<(), ConfigError> {
        let all = [self.kp, self.ki, self.kd, self.integral_cap];
        if all.iter().all(|g| g.is_finite() && *g >= 0.0) {
            Ok(())
        } else {
            Err(ConfigError::InvalidGain)
        }
    }
}

/// Safety monitor limits
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetyConfig {
    /// Abort above this chamber temperature (°C), in any mode
    pub max_temperature_c: f32,
    /// Abort a running profile when no fresh sample arrived for this long (ms)
    pub sample_timeout_ms: u32,
    /// Abort a running profile after this many sensor errors in a row
    pub max_sensor_errors: u8,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_temperature_c: 280.0,
            sample_timeout_ms: 2_000,
            max_sensor_errors: 5,
        }
    }
}

impl SafetyConfig {
    /// Check limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_temperature_c.is_finite()
            || self.sample_timeout_ms == 0
            || self.max_sensor_errors == 0
        {
            return Err(ConfigError::InvalidSafetyLimit);
        }
        Ok(())
    }
}

/// Complete oven configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OvenConfig {
    /// Firing and cadence timing
    pub timing: TimingConfig,
    /// Feedback controller gains
    pub pid: PidGains,
    /// Safety limits
    pub safety: SafetyConfig,
    /// Profile executed on start
    pub profile: Profile,
}

impl Default for OvenConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            pid: PidGains::default(),
            safety: SafetyConfig::default(),
            profile: Profile::standard(),
        }
    }
}

impl OvenConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        self.pid.validate()?;
        self.safety.validate()?;
        if self
            .profile
            .segments()
            .iter()
            .any(|s| !s.target_c().is_finite())
        {
            return Err(ConfigError::InvalidSegment);
        }
        Ok(())
    }
}
