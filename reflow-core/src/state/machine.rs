//! Operating mode definition
//!
//! Heater behaviour is a function of the current mode; the profile runner
//! derives the active target from it on every evaluation.

use super::events::ModeEvent;

/// Operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Heater commanded off, no profile cursor
    Idle,
    /// Following the profile
    Reflow,
    /// Heater commanded off until the error is cleared
    Abort,
    /// Stored mode byte was not recognised
    ///
    /// Never entered through [`OperatingMode::transition`]; only produced by
    /// [`OperatingMode::from_raw`] when shared state has been corrupted.
    Error,
}

/// Abort reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OvenError {
    /// Mode byte held a value outside the defined set
    ErroneousState = 1,
    /// Thermocouple or its converter reported a fault
    SensorFault = 2,
    /// No fresh temperature sample within the allowed time
    SensorStale = 3,
    /// Chamber temperature exceeded the safety limit
    OverTemperature = 4,
    /// Operator cancelled the run
    UserCancel = 5,
    /// External watchdog fired
    Watchdog = 6,
}

impl OvenError {
    /// Numeric code (never zero)
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a numeric code
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(OvenError::ErroneousState),
            2 => Some(OvenError::SensorFault),
            3 => Some(OvenError::SensorStale),
            4 => Some(OvenError::OverTemperature),
            5 => Some(OvenError::UserCancel),
            6 => Some(OvenError::Watchdog),
            _ => None,
        }
    }
}

const RAW_IDLE: u8 = 0;
const RAW_REFLOW: u8 = 1;
const RAW_ABORT: u8 = 2;
const RAW_ERROR: u8 = 0xFF;

impl OperatingMode {
    /// Encode for atomic storage
    pub const fn as_raw(self) -> u8 {
        match self {
            OperatingMode::Idle => RAW_IDLE,
            OperatingMode::Reflow => RAW_REFLOW,
            OperatingMode::Abort => RAW_ABORT,
            OperatingMode::Error => RAW_ERROR,
        }
    }

    /// Decode from atomic storage
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            RAW_IDLE => OperatingMode::Idle,
            RAW_REFLOW => OperatingMode::Reflow,
            RAW_ABORT => OperatingMode::Abort,
            _ => OperatingMode::Error,
        }
    }

    /// Check if leaving this mode needs an explicit clear
    pub fn requires_clear(&self) -> bool {
        matches!(self, OperatingMode::Abort | OperatingMode::Error)
    }

    /// Process an event and return the next mode
    pub fn transition(self, event: ModeEvent) -> Self {
        match (self, event) {
            // Abort wins from anywhere
            (_, ModeEvent::Abort) => OperatingMode::Abort,

            // Idle transitions
            (OperatingMode::Idle, ModeEvent::Start) => OperatingMode::Reflow,

            // Reflow transitions
            (OperatingMode::Reflow, ModeEvent::Start) => OperatingMode::Reflow,
            (OperatingMode::Reflow, ModeEvent::ProfileComplete) => OperatingMode::Idle,

            // Acknowledge
            (OperatingMode::Abort, ModeEvent::ClearError) => OperatingMode::Idle,
            (OperatingMode::Error, ModeEvent::ClearError) => OperatingMode::Idle,

            // Default: stay in current mode
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_to_reflow() {
        let next = OperatingMode::Idle.transition(ModeEvent::Start);
        assert_eq!(next, OperatingMode::Reflow);
    }

    #[test]
    fn test_abort_from_any_mode() {
        let modes = [
            OperatingMode::Idle,
            OperatingMode::Reflow,
            OperatingMode::Abort,
            OperatingMode::Error,
        ];

        for mode in modes {
            assert_eq!(mode.transition(ModeEvent::Abort), OperatingMode::Abort);
        }
    }

    #[test]
    fn test_no_direct_abort_to_reflow() {
        let next = OperatingMode::Abort.transition(ModeEvent::Start);
        assert_eq!(next, OperatingMode::Abort);

        let next = next.transition(ModeEvent::ClearError);
        assert_eq!(next, OperatingMode::Idle);

        let next = next.transition(ModeEvent::Start);
        assert_eq!(next, OperatingMode::Reflow);
    }

    #[test]
    fn test_profile_complete_only_from_reflow() {
        assert_eq!(
            OperatingMode::Reflow.transition(ModeEvent::ProfileComplete),
            OperatingMode::Idle
        );
        assert_eq!(
            OperatingMode::Abort.transition(ModeEvent::ProfileComplete),
            OperatingMode::Abort
        );
    }

    #[test]
    fn test_clear_error_ignored_while_running() {
        assert_eq!(
            OperatingMode::Reflow.transition(ModeEvent::ClearError),
            OperatingMode::Reflow
        );
    }

    #[test]
    fn test_raw_encoding() {
        for mode in [
            OperatingMode::Idle,
            OperatingMode::Reflow,
            OperatingMode::Abort,
            OperatingMode::Error,
        ] {
            assert_eq!(OperatingMode::from_raw(mode.as_raw()), mode);
        }
        assert_eq!(OperatingMode::from_raw(4), OperatingMode::Error);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(OvenError::from_code(0), None);
        assert_eq!(
            OvenError::from_code(OvenError::OverTemperature.code()),
            Some(OvenError::OverTemperature)
        );
    }

    #[test]
    fn test_requires_clear() {
        assert!(OperatingMode::Abort.requires_clear());
        assert!(OperatingMode::Error.requires_clear());
        assert!(!OperatingMode::Idle.requires_clear());
        assert!(!OperatingMode::Reflow.requires_clear());
    }
}
