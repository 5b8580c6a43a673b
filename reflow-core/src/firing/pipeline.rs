//! Zero-cross anchored firing pipeline
//!
//! The timer cascade (zero-cross edge, deskew delay, cycle start, on
//! compare, off compare) is armed once. After that the only work per
//! half-cycle is turning the latest controller output into two compare
//! values, which is bounded arithmetic safe for the trigger context.

use reflow_hal::{FiringWindow, PhaseTimer};

use crate::config::{ConfigError, TimingConfig};
use crate::sync::OutputSlot;
use crate::traits::Compensation;

/// Firing window for one controller output
///
/// The compensated conduction time is clamped to the configured phase
/// angle range. The gate turns on that long before the end of the
/// half-cycle and stays on for the fixed latch width.
pub fn firing_window<C: Compensation>(
    raw_output: f32,
    compensation: &C,
    timing: &TimingConfig,
) -> FiringWindow {
    let count_us = compensation
        .compensate(raw_output)
        .max(timing.min_phase_angle_us)
        .min(timing.max_phase_angle_us);
    let on_ticks = timing.us_to_ticks(timing.half_cycle_us.saturating_sub(count_us));
    let off_ticks = on_ticks.saturating_add(timing.latch_ticks());
    FiringWindow::new(on_ticks, off_ticks)
}

/// Why the cascade could not be armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmError<E> {
    /// Timing does not fit the timer's counters
    Timing(ConfigError),
    /// Timer rejected the configuration
    Timer(E),
}

/// Per-half-cycle firing from the published controller output
///
/// If the output has not been refreshed (sensor read failed) the last
/// value keeps being used; the pipeline never fails closed on its own.
pub struct FiringPipeline<'a, C> {
    output: &'a OutputSlot,
    compensation: C,
    timing: TimingConfig,
}

impl<'a, C: Compensation> FiringPipeline<'a, C> {
    /// Create a pipeline reading from `output`
    pub fn new(
        output: &'a OutputSlot,
        compensation: C,
        timing: TimingConfig,
    ) -> Result<Self, ConfigError> {
        timing.validate()?;
        Ok(Self {
            output,
            compensation,
            timing,
        })
    }

    /// Window for the current output
    pub fn window(&self) -> FiringWindow {
        firing_window(self.output.read(), &self.compensation, &self.timing)
    }

    /// Configure the hardware cascade; called once at start-up
    ///
    /// Refuses timing whose half-cycle overflows the timer's counters,
    /// since every later window would be rejected too.
    pub fn arm<T: PhaseTimer>(&self, timer: &mut T) -> Result<(), ArmError<T::Error>> {
        self.timing
            .check_tick_range(T::MAX_TICKS)
            .map_err(ArmError::Timing)?;
        timer
            .arm(self.timing.deskew_ticks(), self.window())
            .map_err(ArmError::Timer)
    }

    /// Half-cycle trigger: load the compare values for the next cycle
    pub fn on_half_cycle<T: PhaseTimer>(&self, timer: &mut T) -> Result<FiringWindow, T::Error> {
        let window = self.window();
        timer.set_compare_window(window)?;
        Ok(window)
    }

    /// Timing in use
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }
}
