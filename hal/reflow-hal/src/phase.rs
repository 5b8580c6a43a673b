//! Phase-angle firing abstractions
//!
//! The firing hardware is an event cascade configured once:
//!
//! ```text
//! ZEROCROSS edge -> deskew delay -> cycle start -> ON compare -> OFF compare
//!                                        │
//!                                        └── half-cycle trigger to software
//! ```
//!
//! After [`PhaseTimer::arm`] the hardware raises and drops the SSR gate on its
//! own. Software only reloads the two compare values once per half-cycle with
//! [`PhaseTimer::set_compare_window`], so interrupt latency never changes the
//! width of a pulse that is already armed.

/// Share of the half-cycle kept clear before the next detector edge
///
/// Covers mains frequency drift (1/32 is about 3 %) plus the few cycles a
/// hardware sequencer needs to get back to waiting for the edge.
pub const EDGE_GUARD_DIVISOR: u32 = 32;

/// Compare values for one half-cycle, in timer ticks from cycle start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FiringWindow {
    /// Ticks from cycle start until the SSR gate is asserted
    pub on_ticks: u32,
    /// Ticks from cycle start until the SSR gate is released
    pub off_ticks: u32,
}

impl FiringWindow {
    /// Create a window from its two compare values
    pub const fn new(on_ticks: u32, off_ticks: u32) -> Self {
        Self {
            on_ticks,
            off_ticks,
        }
    }

    /// Gate pulse width in ticks
    pub const fn pulse_ticks(&self) -> u32 {
        self.off_ticks.saturating_sub(self.on_ticks)
    }

    /// Gate delay measured from the detector edge that launches the pulse
    ///
    /// For sequencers that cannot watch for the next edge while a pulse is
    /// running. The window is relative to the real crossing, `deskew_ticks`
    /// after the edge. A pulse starting after the next edge is launched
    /// from that edge instead; one that would still be running when it
    /// arrives is pulled in to end a guard band before it. Either way the
    /// pulse ends at least `half_cycle_ticks / EDGE_GUARD_DIVISOR` before
    /// the next edge.
    ///
    /// Returns `None` for an inverted window or when no such delay exists.
    pub fn edge_delay(&self, deskew_ticks: u32, half_cycle_ticks: u32) -> Option<u32> {
        if self.off_ticks <= self.on_ticks {
            return None;
        }
        let pulse = self.pulse_ticks();
        let latest_end = half_cycle_ticks - half_cycle_ticks / EDGE_GUARD_DIVISOR;
        let start = deskew_ticks.checked_add(self.on_ticks)?;

        let delay = if start >= half_cycle_ticks {
            start - half_cycle_ticks
        } else if start.saturating_add(pulse) > latest_end {
            latest_end.checked_sub(pulse)?
        } else {
            start
        };
        (delay.saturating_add(pulse) <= latest_end).then_some(delay)
    }
}

/// Zero-cross synchronised SSR firing timer
///
/// Implementations own the timer/event hardware. The platform is responsible
/// for delivering the half-cycle trigger (cycle start) to the firing
/// pipeline, typically from the highest-priority interrupt or a task awaiting
/// the corresponding hardware flag.
pub trait PhaseTimer {
    /// Error type for timer operations
    type Error;

    /// Largest tick count the hardware can hold in one compare value
    const MAX_TICKS: u32 = u32::MAX;

    /// Configure the firing cascade and start listening for zero-crossings
    ///
    /// # Arguments
    /// * `deskew_ticks` - Delay from the zero-cross detector edge to cycle start
    /// * `initial` - Window used until the first trigger reloads it
    fn arm(&mut self, deskew_ticks: u32, initial: FiringWindow) -> Result<(), Self::Error>;

    /// Load the compare values for the next half-cycle
    ///
    /// Must be cheap enough to call from interrupt context.
    fn set_compare_window(&mut self, window: FiringWindow) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_width() {
        let window = FiringWindow::new(1000, 1150);
        assert_eq!(window.pulse_ticks(), 150);
    }

    #[test]
    fn test_inverted_window_saturates() {
        let window = FiringWindow::new(500, 100);
        assert_eq!(window.pulse_ticks(), 0);
        assert_eq!(window.edge_delay(450, 10_000), None);
    }

    #[test]
    fn test_edge_delay_plain() {
        let window = FiringWindow::new(2_000, 2_150);
        assert_eq!(window.edge_delay(450, 10_000), Some(2_450));
    }

    #[test]
    fn test_edge_delay_moves_to_next_edge() {
        // 450 deskew + 9800 on starts 250 ticks after the next edge
        let window = FiringWindow::new(9_800, 9_950);
        assert_eq!(window.edge_delay(450, 10_000), Some(250));
    }

    #[test]
    fn test_edge_delay_pulled_in_before_edge() {
        // Would run from 9750 to 9900 with the edge at 10000
        let window = FiringWindow::new(9_300, 9_450);
        assert_eq!(window.edge_delay(450, 10_000), Some(9_688 - 150));
    }

    #[test]
    fn test_edge_delay_rejects_deskew_near_half_cycle() {
        let window = FiringWindow::new(9_800, 9_950);
        assert_eq!(window.edge_delay(9_900, 10_000), None);
    }

    #[test]
    fn test_pulse_always_ends_before_next_edge() {
        let half = 10_000;
        let guard = half / EDGE_GUARD_DIVISOR;
        for deskew in [0, 150, 450, 1_000] {
            for on in (400..=9_850).step_by(25) {
                let window = FiringWindow::new(on, on + 150);
                let delay = window.edge_delay(deskew, half).unwrap();
                assert!(
                    delay + 150 + guard <= half,
                    "deskew {} on {} delay {}",
                    deskew,
                    on,
                    delay
                );
            }
        }
    }
}
