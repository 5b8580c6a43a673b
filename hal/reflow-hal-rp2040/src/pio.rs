//! PIO timing helpers
//!
//! Pure arithmetic shared by the PIO firing program: the state machine
//! clock divider, the half-cycle tick budget and the packing of a firing
//! window into one TX FIFO word.
//!
//! # Window word
//!
//! The program shifts the OSR out to the right, 16 bits at a time:
//!
//! ```text
//!  31             16 15              0
//! +-----------------+-----------------+
//! |  pulse ticks    |  edge delay     |
//! +-----------------+-----------------+
//! ```

use reflow_hal::FiringWindow;

/// System clock frequency (RP2040 default)
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// Largest tick count one 16-bit field can hold
pub const MAX_FIELD_TICKS: u32 = 0xFFFF;

/// Calculate the 16.8 fixed-point divider for a state machine clock
///
/// Returns `None` when `tick_hz` is zero, faster than the system clock,
/// or so slow the integer part would not fit 16 bits.
pub fn calc_clock_divider(tick_hz: u32) -> Option<u32> {
    if tick_hz == 0 || tick_hz > SYS_CLK_HZ {
        return None;
    }
    let divider_x256 = (u64::from(SYS_CLK_HZ) * 256) / u64::from(tick_hz);
    if divider_x256 >= 0x1_0000 * 256 {
        return None;
    }
    Some(divider_x256 as u32)
}

/// Ticks in one half-cycle at `tick_hz`
///
/// Returns `None` when the half-cycle rounds to zero ticks or does not fit
/// a 16-bit field.
pub fn half_cycle_ticks(tick_hz: u32, half_cycle_us: u32) -> Option<u32> {
    let ticks = u64::from(half_cycle_us) * u64::from(tick_hz) / 1_000_000;
    if ticks == 0 || ticks > u64::from(MAX_FIELD_TICKS) {
        return None;
    }
    Some(ticks as u32)
}

/// Pack a firing window into a TX FIFO word
///
/// The low field is the delay from the detector edge, see
/// [`FiringWindow::edge_delay`]. Returns `None` when the window is
/// inverted or cannot end before the next edge.
pub fn pack_window(window: FiringWindow, deskew_ticks: u32, half_ticks: u32) -> Option<u32> {
    let delay = window.edge_delay(deskew_ticks, half_ticks)?;
    let pulse = window.pulse_ticks();
    if delay > MAX_FIELD_TICKS || pulse > MAX_FIELD_TICKS {
        return None;
    }
    Some((pulse << 16) | delay)
}
