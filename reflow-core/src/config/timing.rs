//! Firing and cadence timing
//!
//! All phase-angle values are expressed in microseconds and converted to
//! timer ticks with [`TimingConfig::us_to_ticks`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::ConfigError;

/// Shortest allowed sampling interval (ms)
pub const MIN_SAMPLE_INTERVAL_MS: u32 = 100;

/// Shortest allowed state-evaluation interval (ms)
pub const MIN_STATE_INTERVAL_MS: u32 = 500;

/// Timing constants for the firing pipeline and the supervisory task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Width of one mains half-cycle (µs), 10000 for 50 Hz, 8333 for 60 Hz
    pub half_cycle_us: u32,
    /// Delay from the zero-cross detector edge to the real crossing (µs)
    pub zero_cross_delay_us: u32,
    /// Gate pulse width needed to latch the SSR (µs)
    pub ssr_latch_us: u32,
    /// Shortest conduction time the pipeline will command (µs)
    pub min_phase_angle_us: u32,
    /// Longest conduction time the pipeline will command (µs)
    pub max_phase_angle_us: u32,
    /// Firing timer clock (Hz)
    pub timer_clock_hz: u32,
    /// Temperature sampling interval (ms)
    pub sample_interval_ms: u32,
    /// Profile state evaluation interval (ms)
    pub state_interval_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            half_cycle_us: 10_000,
            zero_cross_delay_us: 450,
            ssr_latch_us: 150,
            min_phase_angle_us: 200,
            max_phase_angle_us: 9_600,
            timer_clock_hz: 1_000_000,
            sample_interval_ms: MIN_SAMPLE_INTERVAL_MS,
            state_interval_ms: MIN_STATE_INTERVAL_MS,
        }
    }
}

impl TimingConfig {
    /// Convert microseconds to firing timer ticks (truncating)
    pub fn us_to_ticks(&self, us: u32) -> u32 {
        let ticks = u64::from(us) * u64::from(self.timer_clock_hz) / 1_000_000;
        ticks.min(u64::from(u32::MAX)) as u32
    }

    /// Zero-cross deskew delay in ticks
    pub fn deskew_ticks(&self) -> u32 {
        self.us_to_ticks(self.zero_cross_delay_us)
    }

    /// SSR latch pulse width in ticks
    pub fn latch_ticks(&self) -> u32 {
        self.us_to_ticks(self.ssr_latch_us)
    }

    /// One half-cycle in ticks
    pub fn half_cycle_ticks(&self) -> u32 {
        self.us_to_ticks(self.half_cycle_us)
    }

    /// Check that every tick value fits a timer counting up to `max_ticks`
    ///
    /// Windows and the deskew delay never exceed one half-cycle, so the
    /// half-cycle bounds them all.
    pub fn check_tick_range(&self, max_ticks: u32) -> Result<(), ConfigError> {
        if self.half_cycle_ticks() > max_ticks {
            return Err(ConfigError::TickRangeExceeded);
        }
        Ok(())
    }

    /// Check that the timing constants describe a safe firing window
    ///
    /// The latch pulse must end before the next zero-crossing even at the
    /// shortest conduction time, otherwise the TRIAC would carry over into
    /// the following half-cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.half_cycle_us == 0 {
            return Err(ConfigError::ZeroHalfCycle);
        }
        if self.timer_clock_hz == 0 {
            return Err(ConfigError::ZeroTimerClock);
        }
        if self.min_phase_angle_us > self.max_phase_angle_us
            || self.max_phase_angle_us > self.half_cycle_us
        {
            return Err(ConfigError::PhaseAngleRange);
        }
        if self.latch_ticks() == 0 {
            return Err(ConfigError::LatchTooShort);
        }
        if self.ssr_latch_us > self.min_phase_angle_us {
            return Err(ConfigError::LatchExceedsMinAngle);
        }
        if self.zero_cross_delay_us >= self.half_cycle_us {
            return Err(ConfigError::DeskewTooLong);
        }
        if self.sample_interval_ms < MIN_SAMPLE_INTERVAL_MS {
            return Err(ConfigError::SampleIntervalTooShort);
        }
        if self.state_interval_ms < MIN_STATE_INTERVAL_MS {
            return Err(ConfigError::StateIntervalTooShort);
        }
        Ok(())
    }
}
