//! Cadence-gated supervisory task
//!
//! Called repeatedly from the platform's cooperative loop with a
//! monotonic millisecond clock. Each call runs whichever duties are due:
//!
//! - Sampling: poll the thermocouple, update the feedback controller and
//!   publish its output to the firing pipeline.
//! - State evaluation: run the profile state machine.
//!
//! Sensor problems never propagate as errors; the sample is skipped and
//! the controller output free-runs until the next good reading.

use crate::config::TimingConfig;
use crate::oven::OvenController;
use crate::profile::{Profile, ProfileEvent, ProfileRunner};
use crate::traits::{FeedbackController, SensorStatus, ThermocoupleSensor};

/// Result of one sampling duty
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleOutcome {
    /// Fresh reading fed to the controller
    Updated {
        temperature_c: f32,
        output: f32,
        dt_s: f32,
    },
    /// Converter had nothing new; output left unchanged
    NoFreshReading,
    /// Bus or device error; output left unchanged
    SensorError,
}

/// What one [`SupervisoryTask::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    /// Set when the sampling duty ran
    pub sample: Option<SampleOutcome>,
    /// Set when state evaluation produced an event
    pub profile: Option<ProfileEvent>,
    /// Set when state evaluation ran
    pub evaluated: bool,
}

/// Supervisory task state
///
/// Owns the sensor, the feedback controller and the profile runner. All
/// state carried between calls lives here.
pub struct SupervisoryTask<'a, S, C> {
    oven: &'a OvenController,
    sensor: S,
    controller: C,
    runner: ProfileRunner<'a>,
    sample_interval_ms: u64,
    state_interval_ms: u64,
    last_sample_ms: u64,
    last_update_ms: u64,
    last_state_ms: u64,
}

impl<'a, S, C> SupervisoryTask<'a, S, C>
where
    S: ThermocoupleSensor,
    C: FeedbackController,
{
    /// Create a task; the first poll runs both duties
    pub fn new(
        oven: &'a OvenController,
        profile: &'a Profile,
        sensor: S,
        controller: C,
        timing: &TimingConfig,
    ) -> Self {
        let sample_interval_ms = u64::from(timing.sample_interval_ms);
        let state_interval_ms = u64::from(timing.state_interval_ms);
        Self {
            oven,
            sensor,
            controller,
            runner: ProfileRunner::new(profile),
            sample_interval_ms,
            state_interval_ms,
            last_sample_ms: 0u64.wrapping_sub(sample_interval_ms),
            last_update_ms: 0,
            last_state_ms: 0u64.wrapping_sub(state_interval_ms),
        }
    }

    /// Run any duty whose interval has elapsed
    pub fn poll(&mut self, now_ms: u64) -> PollReport {
        let mut report = PollReport::default();

        if now_ms.wrapping_sub(self.last_sample_ms) >= self.sample_interval_ms {
            report.sample = Some(self.sample(now_ms));
            self.last_sample_ms = now_ms;
        }

        if now_ms.wrapping_sub(self.last_state_ms) >= self.state_interval_ms {
            report.profile = self.runner.evaluate(self.oven, now_ms);
            report.evaluated = true;
            if let Some(ProfileEvent::Started { .. }) = report.profile {
                // Drop integral and derivative history from the previous run
                self.controller.reset();
            }
            self.last_state_ms = now_ms;
        }

        report
    }

    fn sample(&mut self, now_ms: u64) -> SampleOutcome {
        let status = match self.sensor.poll_status() {
            Ok(status) => status,
            Err(_) => return SampleOutcome::SensorError,
        };
        if !status.contains(SensorStatus::FRESH_SAMPLE) {
            return SampleOutcome::NoFreshReading;
        }

        let temperature_c = match self.sensor.read_temperature() {
            Ok(t) => t,
            Err(_) => return SampleOutcome::SensorError,
        };
        if self.sensor.clear_status(SensorStatus::FRESH_SAMPLE).is_err() {
            return SampleOutcome::SensorError;
        }
        self.oven.set_temperature(temperature_c);

        let dt_s = now_ms.saturating_sub(self.last_update_ms) as f32 / 1000.0;
        let setpoint = self.oven.target_temperature();
        let output = self.controller.update(temperature_c, setpoint, dt_s);
        self.oven.publish_output(output);
        self.last_update_ms = now_ms;

        SampleOutcome::Updated {
            temperature_c,
            output,
            dt_s,
        }
    }

    /// Profile runner, for inspection
    pub fn runner(&self) -> &ProfileRunner<'a> {
        &self.runner
    }

    /// Feedback controller, for inspection
    pub fn controller(&self) -> &C {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSegment;
    use crate::state::OperatingMode;

    /// Scripted sensor; each poll consumes one entry
    struct MockSensor {
        script: &'static [Option<f32>],
        pos: usize,
        fail: bool,
        cleared: usize,
    }

    impl MockSensor {
        fn new(script: &'static [Option<f32>]) -> Self {
            Self {
                script,
                pos: 0,
                fail: false,
                cleared: 0,
            }
        }

        fn current(&self) -> Option<f32> {
            self.script.get(self.pos).copied().flatten()
        }
    }

    impl ThermocoupleSensor for MockSensor {
        type Error = ();

        fn poll_status(&mut self) -> Result<SensorStatus, ()> {
            if self.fail {
                return Err(());
            }
            if self.current().is_some() {
                Ok(SensorStatus::FRESH_SAMPLE)
            } else {
                self.pos += 1;
                Ok(SensorStatus::EMPTY)
            }
        }

        fn read_temperature(&mut self) -> Result<f32, ()> {
            self.current().ok_or(())
        }

        fn clear_status(&mut self, flags: SensorStatus) -> Result<(), ()> {
            assert!(flags.contains(SensorStatus::FRESH_SAMPLE));
            self.pos += 1;
            self.cleared += 1;
            Ok(())
        }
    }

    /// Output = setpoint - measured, remembers the last dt
    #[derive(Default)]
    struct MockController {
        output: f32,
        last_dt: f32,
        updates: usize,
        resets: usize,
    }

    impl FeedbackController for MockController {
        fn update(&mut self, measured: f32, setpoint: f32, dt_s: f32) -> f32 {
            self.output = (setpoint - measured).max(0.0);
            self.last_dt = dt_s;
            self.updates += 1;
            self.output
        }

        fn output(&self) -> f32 {
            self.output
        }

        fn output_range(&self) -> f32 {
            10_000.0
        }

        fn reset(&mut self) {
            self.output = 0.0;
            self.resets += 1;
        }
    }

    const ONE: [Option<f32>; 1] = [Some(25.0)];
    const STEADY: [Option<f32>; 16] = [Some(25.0); 16];
    const GAP: [Option<f32>; 5] = [Some(25.0), Some(25.0), None, None, Some(100.0)];

    fn profile() -> Profile {
        Profile::from_segments(&[ProfileSegment::new(150.0, 1_000)]).unwrap()
    }

    #[test]
    fn test_first_poll_runs_both_duties() {
        let oven = OvenController::new();
        let profile = profile();
        let sensor = MockSensor::new(&ONE);
        let mut task = SupervisoryTask::new(
            &oven,
            &profile,
            sensor,
            MockController::default(),
            &TimingConfig::default(),
        );

        let report = task.poll(0);
        assert!(report.evaluated);
        assert!(matches!(
            report.sample,
            Some(SampleOutcome::Updated { temperature_c, .. }) if temperature_c == 25.0
        ));
        assert_eq!(oven.temperature(), 25.0);
        assert_eq!(task.sensor.cleared, 1);
    }

    #[test]
    fn test_cadence() {
        let oven = OvenController::new();
        let profile = profile();
        let sensor = MockSensor::new(&STEADY);
        let mut task = SupervisoryTask::new(
            &oven,
            &profile,
            sensor,
            MockController::default(),
            &TimingConfig::default(),
        );

        task.poll(0);
        let report = task.poll(50);
        assert_eq!(report.sample, None);
        assert!(!report.evaluated);

        let report = task.poll(100);
        assert!(report.sample.is_some());
        assert!(!report.evaluated);

        let report = task.poll(499);
        assert!(report.sample.is_some());
        assert!(!report.evaluated);

        let report = task.poll(500);
        assert!(report.evaluated);
        assert_eq!(task.controller().updates, 3);
    }

    #[test]
    fn test_start_drives_setpoint() {
        let oven = OvenController::new();
        let profile = profile();
        let sensor = MockSensor::new(&STEADY);
        let mut task = SupervisoryTask::new(
            &oven,
            &profile,
            sensor,
            MockController::default(),
            &TimingConfig::default(),
        );

        task.poll(0);
        assert_eq!(oven.output(), 0.0);

        oven.start();
        let report = task.poll(500);
        assert_eq!(
            report.profile,
            Some(ProfileEvent::Started { target_c: 150.0 })
        );
        assert_eq!(oven.mode(), OperatingMode::Reflow);
        assert_eq!(task.controller().resets, 1);

        // Setpoint change is picked up on the next sampling tick
        task.poll(600);
        assert_eq!(oven.output(), 125.0);
    }

    #[test]
    fn test_missed_sample_keeps_output() {
        let oven = OvenController::new();
        let profile = profile();
        let sensor = MockSensor::new(&GAP);
        let mut task = SupervisoryTask::new(
            &oven,
            &profile,
            sensor,
            MockController::default(),
            &TimingConfig::default(),
        );

        oven.start();
        task.poll(0);
        task.poll(100);
        assert_eq!(oven.output(), 125.0);

        let report = task.poll(200);
        assert_eq!(report.sample, Some(SampleOutcome::NoFreshReading));
        assert_eq!(oven.output(), 125.0);
        task.poll(300);
        assert_eq!(oven.output(), 125.0);

        // dt spans the gap since the last real update
        let report = task.poll(400);
        assert_eq!(
            report.sample,
            Some(SampleOutcome::Updated {
                temperature_c: 100.0,
                output: 50.0,
                dt_s: 0.3,
            })
        );
        assert_eq!(task.controller().last_dt, 0.3);
    }

    #[test]
    fn test_sensor_error_is_not_fatal() {
        let oven = OvenController::new();
        let profile = profile();
        let mut sensor = MockSensor::new(&ONE);
        sensor.fail = true;
        let mut task = SupervisoryTask::new(
            &oven,
            &profile,
            sensor,
            MockController::default(),
            &TimingConfig::default(),
        );

        oven.start();
        let report = task.poll(0);
        assert_eq!(report.sample, Some(SampleOutcome::SensorError));
        assert_eq!(oven.mode(), OperatingMode::Reflow);
        assert_eq!(task.controller().updates, 0);
    }
}
