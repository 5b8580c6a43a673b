//! Reflow oven controller firmware
//!
//! Main firmware binary for RP2040-based reflow oven controllers. A
//! thermocouple converter on I²C feeds a PID loop; its output is turned
//! into a phase-angle firing window for the SSR on every mains
//! half-cycle by a PIO state machine synchronised to the zero-cross
//! detector.
//!
//! Board wiring:
//!
//! | Signal            | Pin    |
//! |-------------------|--------|
//! | I²C0 SDA          | GPIO4  |
//! | I²C0 SCL          | GPIO5  |
//! | Zero-cross detect | GPIO14 |
//! | SSR gate          | GPIO15 |
//! | Start button      | GPIO16 |
//! | Stop button       | GPIO17 |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::Pio;
use embassy_rp::watchdog::{ResetReason, Watchdog};
use embassy_time::Instant;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use reflow_core::firing::FiringPipeline;
use reflow_core::safety::SafetyMonitor;
use reflow_core::supervisor::SupervisoryTask;
use reflow_core::OvenError;
use reflow_drivers::heater::{PhaseAngleTable, PidConfig, PidController};
use reflow_drivers::sensor::Mcp9600;
use reflow_hal_rp2040::PioPhaseTimer;

use crate::config::{parse_config, FirmwareConfig};
use crate::shared::OVEN;
use crate::tasks::TABLE_SIZE;

mod config;
mod shared;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit oven.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../oven.toml");

/// I²C clock for the thermocouple converter
const I2C_FREQUENCY_HZ: u32 = 100_000;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

// Static cells for data borrowed by tasks for the program lifetime
static CONFIG: StaticCell<FirmwareConfig> = StaticCell::new();
static PHASE_TABLE: StaticCell<PhaseAngleTable<TABLE_SIZE>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Reflow oven firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let watchdog = Watchdog::new(p.WATCHDOG);
    if let Some(ResetReason::TimedOut) = watchdog.reset_reason() {
        warn!("Reset by watchdog, holding oven in Abort");
        OVEN.abort(OvenError::Watchdog);
    }

    let config: &'static FirmwareConfig = CONFIG.init(load_config());
    let timing = config.oven.timing;
    info!(
        "Profile: {} segments, {} ms minimum",
        config.oven.profile.len(),
        config.oven.profile.total_dwell_ms()
    );

    // Output is microseconds of conduction per half-cycle
    let output_range = timing.half_cycle_us as f32;

    // Thermocouple converter
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

    let mut sensor = Mcp9600::new(i2c, config.sensor);
    match sensor.init() {
        Ok(revision) => info!("MCP9600 ready, revision {=u8:#x}", revision),
        // Keep going: the safety monitor aborts a run without fresh samples
        Err(e) => error!("MCP9600 init failed: {:?}", Debug2Format(&e)),
    }

    let pid = PidController::new(PidConfig::from_gains(&config.oven.pid, output_range));
    let supervisor = SupervisoryTask::new(&OVEN, &config.oven.profile, sensor, pid, &timing);
    let safety = SafetyMonitor::new(config.oven.safety, Instant::now().as_millis());

    // Zero-cross synchronised firing on PIO0
    let Pio {
        mut common,
        sm0,
        irq0,
        ..
    } = Pio::new(p.PIO0, Irqs);

    let table: &'static PhaseAngleTable<TABLE_SIZE> =
        PHASE_TABLE.init(PhaseAngleTable::new(timing.half_cycle_us, output_range));

    let firing = match (
        PioPhaseTimer::new(
            &mut common,
            sm0,
            p.PIN_14,
            p.PIN_15,
            timing.timer_clock_hz,
            timing.half_cycle_us,
        ),
        FiringPipeline::new(OVEN.output_slot(), table, timing),
    ) {
        (Ok(timer), Ok(pipeline)) => Some((timer, pipeline)),
        (Err(e), _) => {
            error!("Phase timer setup failed: {}", e);
            None
        }
        (_, Err(e)) => {
            error!("Invalid firing timing: {}", e);
            None
        }
    };

    // Buttons (active low)
    let start_button = Input::new(p.PIN_16, Pull::Up);
    let stop_button = Input::new(p.PIN_17, Pull::Up);

    // Spawn tasks
    spawner
        .spawn(tasks::supervisor_task(supervisor, safety, watchdog))
        .unwrap();
    spawner
        .spawn(tasks::buttons_task(start_button, stop_button))
        .unwrap();
    if let Some((timer, pipeline)) = firing {
        spawner
            .spawn(tasks::firing_task(pipeline, timer, irq0))
            .unwrap();
    } else {
        // Heater cannot fire; refuse to start a profile
        OVEN.abort(OvenError::ErroneousState);
    }

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded configuration
///
/// Falls back to built-in defaults if oven.toml is rejected, which
/// build.rs should already have prevented.
fn load_config() -> FirmwareConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using default configuration");
            FirmwareConfig::default()
        }
    }
}
