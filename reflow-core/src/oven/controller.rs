//! Oven controller facade
//!
//! The one process-wide aggregate. Every operation is non-blocking and
//! safe to call from any context: mode, error, temperatures and the
//! controller output all live in atomic cells.

use crate::state::{ModeEvent, OperatingMode, OvenError};
use crate::sync::{ErrorCell, F32Cell, ModeCell, OutputSlot};

/// Point-in-time view of the oven, for logging
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OvenStatus {
    pub mode: OperatingMode,
    pub temperature_c: f32,
    pub target_c: f32,
    pub output: f32,
    pub error: Option<OvenError>,
}

/// Shared oven state and the public control surface
///
/// Usable as a `static`; starts in Idle with no error recorded.
#[derive(Debug)]
pub struct OvenController {
    mode: ModeCell,
    error: ErrorCell,
    temperature: F32Cell,
    target: F32Cell,
    output: OutputSlot,
}

impl OvenController {
    /// Create a controller in Idle
    pub const fn new() -> Self {
        Self {
            mode: ModeCell::new(OperatingMode::Idle),
            error: ErrorCell::new(),
            temperature: F32Cell::new(0.0),
            target: F32Cell::new(0.0),
            output: OutputSlot::new(),
        }
    }

    /// Current operating mode
    pub fn mode(&self) -> OperatingMode {
        self.mode.load()
    }

    /// Last measured chamber temperature (°C)
    pub fn temperature(&self) -> f32 {
        self.temperature.get()
    }

    /// Active target temperature (°C)
    pub fn target_temperature(&self) -> f32 {
        self.target.get()
    }

    /// Request a profile run
    ///
    /// Takes effect on the next state evaluation. Ignored while in Abort or
    /// Error; repeated while already running it changes nothing. Returns
    /// whether the oven is now in Reflow.
    pub fn start(&self) -> bool {
        self.mode.apply(ModeEvent::Start).to == OperatingMode::Reflow
    }

    /// Record `reason`, force Abort and drop the target to zero
    ///
    /// All three are visible to every context before this returns. The
    /// output then converges toward its minimum on the following samples.
    pub fn abort(&self, reason: OvenError) {
        self.error.store(reason);
        self.mode.apply(ModeEvent::Abort);
        self.target.set(0.0);
    }

    /// Last abort reason
    ///
    /// Kept after [`clear_error`](Self::clear_error) so it can still be
    /// inspected; overwritten by the next abort.
    pub fn error(&self) -> Option<OvenError> {
        self.error.load()
    }

    /// Acknowledge an abort and return to Idle
    ///
    /// Does nothing unless the oven is in Abort or Error.
    pub fn clear_error(&self) {
        self.mode.apply(ModeEvent::ClearError);
    }

    /// Latest published controller output
    pub fn output(&self) -> f32 {
        self.output.read()
    }

    /// Output slot read by the firing trigger
    pub fn output_slot(&self) -> &OutputSlot {
        &self.output
    }

    /// Snapshot for logging
    pub fn status(&self) -> OvenStatus {
        OvenStatus {
            mode: self.mode(),
            temperature_c: self.temperature(),
            target_c: self.target_temperature(),
            output: self.output(),
            error: self.error(),
        }
    }

    pub(crate) fn set_temperature(&self, temperature_c: f32) {
        self.temperature.set(temperature_c);
    }

    pub(crate) fn set_target(&self, target_c: f32) {
        self.target.set(target_c);
    }

    /// Write a segment target, dropped again if the oven left Reflow
    ///
    /// An abort can land between the caller's mode check and this write;
    /// the re-check restores the zero target it set. Returns whether the
    /// target stands.
    pub(crate) fn set_run_target(&self, target_c: f32) -> bool {
        self.target.set(target_c);
        if self.mode() == OperatingMode::Reflow {
            return true;
        }
        self.target.set(0.0);
        false
    }

    pub(crate) fn publish_output(&self, output: f32) {
        self.output.publish(output);
    }

    /// Reflow -> Idle; a concurrent abort is left in place
    pub(crate) fn finish_run(&self) {
        self.mode.apply(ModeEvent::ProfileComplete);
    }

    pub(crate) fn raw_mode(&self) -> u8 {
        self.mode.raw()
    }

    /// Mode and run generation observed together
    pub(crate) fn run_state(&self) -> (OperatingMode, u32) {
        let (raw, generation) = self.mode.snapshot();
        (OperatingMode::from_raw(raw), generation)
    }

    #[cfg(test)]
    pub(crate) fn force_raw_mode(&self, raw: u8) {
        self.mode.store_raw(raw);
    }
}

impl Default for OvenController {
    fn default() -> Self {
        Self::new()
    }
}
