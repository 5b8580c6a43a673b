//! Supervisory task
//!
//! Drives [`SupervisoryTask::poll`] from a fast ticker; the core gates
//! sampling and profile evaluation on their own cadences. Each tick also
//! runs the safety checks and feeds the hardware watchdog, so a stalled
//! loop resets the board.

use defmt::*;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Instant, Ticker};

use reflow_core::profile::ProfileEvent;
use reflow_core::safety::{SafetyMonitor, SafetyStatus};
use reflow_core::supervisor::{SampleOutcome, SupervisoryTask};
use reflow_drivers::heater::PidController;
use reflow_drivers::sensor::Mcp9600;

use crate::shared::OVEN;

/// Poll period; finer than any duty cadence
const POLL_INTERVAL_MS: u64 = 10;

/// Watchdog timeout
const WATCHDOG_TIMEOUT_MS: u64 = 500;

/// Status log period
const STATUS_INTERVAL_MS: u64 = 5_000;

/// Bus the thermocouple converter sits on
pub type ThermocoupleBus = I2c<'static, I2C0, Blocking>;

/// Supervisory task with the board's sensor and controller
pub type OvenSupervisor = SupervisoryTask<'static, Mcp9600<ThermocoupleBus>, PidController>;

/// Supervisor task
#[embassy_executor::task]
pub async fn supervisor_task(
    mut supervisor: OvenSupervisor,
    mut safety: SafetyMonitor,
    mut watchdog: Watchdog,
) {
    info!("Supervisor task started");

    watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut last_status_ms = 0u64;

    loop {
        watchdog.feed();

        let now_ms = Instant::now().as_millis();
        let report = supervisor.poll(now_ms);
        safety.observe(&report, now_ms);

        match report.sample {
            Some(SampleOutcome::SensorError) => {
                warn!(
                    "Thermocouple read failed ({} in a row)",
                    safety.consecutive_errors()
                );
            }
            Some(SampleOutcome::Updated {
                temperature_c,
                output,
                ..
            }) => {
                trace!("T={}C output={}", temperature_c, output);
            }
            Some(SampleOutcome::NoFreshReading) | None => {}
        }

        if let Some(event) = report.profile {
            log_profile_event(event);
        }

        let mode = OVEN.mode();
        if !mode.requires_clear() {
            if let SafetyStatus::Fault(reason) = safety.check(now_ms, mode) {
                error!("Safety fault: {}", reason);
                OVEN.abort(reason);
            }
        }

        if now_ms.saturating_sub(last_status_ms) >= STATUS_INTERVAL_MS {
            let status = OVEN.status();
            info!(
                "{} T={}C target={}C output={} error={}",
                status.mode, status.temperature_c, status.target_c, status.output, status.error
            );
            last_status_ms = now_ms;
        }

        ticker.next().await;
    }
}

fn log_profile_event(event: ProfileEvent) {
    match event {
        ProfileEvent::Started { target_c } => info!("Profile started, target {}C", target_c),
        ProfileEvent::SegmentAdvanced { index, target_c } => {
            info!("Segment {} started, target {}C", index, target_c)
        }
        ProfileEvent::Completed => info!("Profile complete"),
        ProfileEvent::EmptyProfile => warn!("Start requested with an empty profile"),
        ProfileEvent::Interrupted(mode) => warn!("Profile interrupted, mode {}", mode),
        ProfileEvent::CorruptMode(raw) => error!("Corrupt mode byte {=u8:#x}, aborting", raw),
    }
}
