//! Operator buttons
//!
//! Start runs the profile. Stop cancels a running profile, or
//! acknowledges an abort so the oven returns to Idle.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use reflow_core::{OperatingMode, OvenError};

use crate::shared::OVEN;

/// Contact bounce settle time
const DEBOUNCE_MS: u64 = 30;

/// Buttons task
///
/// Both inputs are active low with pull-ups.
#[embassy_executor::task]
pub async fn buttons_task(mut start: Input<'static>, mut stop: Input<'static>) {
    info!("Buttons task started");

    loop {
        let pressed = select(start.wait_for_falling_edge(), stop.wait_for_falling_edge()).await;

        match pressed {
            Either::First(()) => {
                if !still_pressed(&start).await {
                    continue;
                }
                if OVEN.start() {
                    info!("Profile start requested");
                } else {
                    warn!("Start ignored in mode {}", OVEN.mode());
                }
            }
            Either::Second(()) => {
                if !still_pressed(&stop).await {
                    continue;
                }
                let mode = OVEN.mode();
                if mode.requires_clear() {
                    info!("Error acknowledged: {}", OVEN.error());
                    OVEN.clear_error();
                } else if mode == OperatingMode::Reflow {
                    info!("Run cancelled by operator");
                    OVEN.abort(OvenError::UserCancel);
                }
            }
        }
    }
}

async fn still_pressed(pin: &Input<'static>) -> bool {
    Timer::after_millis(DEBOUNCE_MS).await;
    pin.is_low()
}
