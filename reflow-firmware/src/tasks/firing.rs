//! Half-cycle firing task
//!
//! Arms the PIO cascade once, then waits on the cycle-start IRQ the
//! program raises at each zero-cross edge and loads the window for the
//! next half-cycle.

use defmt::*;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::Irq;

use reflow_core::firing::FiringPipeline;
use reflow_core::OvenError;
use reflow_drivers::heater::PhaseAngleTable;
use reflow_hal_rp2040::PioPhaseTimer;

use crate::shared::OVEN;

/// Entries in the phase-angle compensation table
pub const TABLE_SIZE: usize = 256;

/// Phase timer on PIO0 state machine 0
pub type FiringTimer = PioPhaseTimer<'static, PIO0, 0>;

/// Pipeline reading the oven's published output
pub type OvenFiring = FiringPipeline<'static, &'static PhaseAngleTable<TABLE_SIZE>>;

/// Firing task
#[embassy_executor::task]
pub async fn firing_task(pipeline: OvenFiring, mut timer: FiringTimer, mut irq: Irq<'static, PIO0, 0>) {
    info!("Firing task started");

    let timing = pipeline.timing();
    if let Err(e) = pipeline.arm(&mut timer) {
        // Heater cannot fire; refuse to start a profile
        error!("Failed to arm phase timer: {}", e);
        OVEN.abort(OvenError::ErroneousState);
        return;
    }
    info!(
        "Phase timer armed: half-cycle {}us, deskew {} ticks, latch {} ticks",
        timing.half_cycle_us,
        timing.deskew_ticks(),
        timing.latch_ticks()
    );

    loop {
        irq.wait().await;

        match pipeline.on_half_cycle(&mut timer) {
            Ok(window) => trace!("Window on={} off={}", window.on_ticks, window.off_ticks),
            // The program keeps reusing its last window
            Err(e) => warn!("Firing window not loaded: {}", e),
        }
    }
}
