//! Events that trigger mode transitions

/// Events that can trigger mode transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeEvent {
    /// Operator requested a profile run
    Start,
    /// The profile cursor ran out of segments
    ProfileComplete,
    /// Abort requested (operator, watchdog or defensive fallback)
    Abort,
    /// Operator acknowledged the abort
    ClearError,
}
