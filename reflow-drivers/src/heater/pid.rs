//! PID feedback controller
//!
//! Produces a conduction time (µs per half-cycle) in `[0, output_range]`
//! for the phase-angle firing pipeline. The integral accumulator is
//! clamped for anti-windup and the derivative acts on the error.

use reflow_core::config::PidGains;
use reflow_core::traits::FeedbackController;

/// PID controller configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidConfig {
    /// Upper output bound
    pub output_range: f32,
    /// Integral accumulator limit (±)
    pub integral_cap: f32,
    /// Proportional gain
    pub kp: f32,
    /// Integral gain (per second)
    pub ki: f32,
    /// Derivative gain (seconds)
    pub kd: f32,
}

impl PidConfig {
    /// Build from configured gains
    pub fn from_gains(gains: &PidGains, output_range: f32) -> Self {
        Self {
            output_range,
            integral_cap: gains.integral_cap,
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
        }
    }
}

/// Snapshot of the controller variables after the last update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerState {
    pub measured: f32,
    pub setpoint: f32,
    pub elapsed_s: f32,
    pub output: f32,
    pub integral: f32,
}

/// Float PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    state: ControllerState,
    prev_error: Option<f32>,
}

impl PidController {
    /// Create a new PID controller
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            state: ControllerState::default(),
            prev_error: None,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Variables from the last update
    pub fn state(&self) -> ControllerState {
        self.state
    }

    fn compute(&mut self, error: f32, dt_s: f32) -> f32 {
        let cfg = &self.config;

        if dt_s > 0.0 {
            let integral = self.state.integral + cfg.ki * error * dt_s;
            self.state.integral = integral.max(-cfg.integral_cap).min(cfg.integral_cap);
        }

        let derivative = match self.prev_error {
            Some(prev) if dt_s > 0.0 => cfg.kd * (error - prev) / dt_s,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let output = cfg.kp * error + self.state.integral + derivative;
        output.max(0.0).min(cfg.output_range)
    }
}

impl FeedbackController for PidController {
    fn update(&mut self, measured: f32, setpoint: f32, dt_s: f32) -> f32 {
        self.state.measured = measured;
        self.state.setpoint = setpoint;
        self.state.elapsed_s = dt_s;

        let error = setpoint - measured;
        // A NaN reading would poison the accumulator; hold the last output
        if error.is_finite() && dt_s.is_finite() {
            self.state.output = self.compute(error, dt_s);
        }
        self.state.output
    }

    fn output(&self) -> f32 {
        self.state.output
    }

    fn output_range(&self) -> f32 {
        self.config.output_range
    }

    fn reset(&mut self) {
        self.state = ControllerState::default();
        self.prev_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kp: f32, ki: f32, kd: f32) -> PidConfig {
        PidConfig {
            output_range: 10_000.0,
            integral_cap: 1_000.0,
            kp,
            ki,
            kd,
        }
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::new(config(100.0, 0.0, 0.0));
        assert_eq!(pid.update(140.0, 150.0, 0.1), 1_000.0);
        assert_eq!(pid.output(), 1_000.0);
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = PidController::new(config(100.0, 0.0, 0.0));
        assert_eq!(pid.update(20.0, 250.0, 0.1), 10_000.0);
        assert_eq!(pid.update(250.0, 20.0, 0.1), 0.0);
    }

    #[test]
    fn test_integral_anti_windup() {
        let mut pid = PidController::new(config(0.0, 10.0, 0.0));
        for _ in 0..1_000 {
            pid.update(0.0, 200.0, 1.0);
        }
        assert_eq!(pid.state().integral, 1_000.0);
        assert_eq!(pid.output(), 1_000.0);

        for _ in 0..1_000 {
            pid.update(200.0, 0.0, 1.0);
        }
        assert_eq!(pid.state().integral, -1_000.0);
        assert_eq!(pid.output(), 0.0);
    }

    #[test]
    fn test_zero_dt_skips_integral_and_derivative() {
        let mut pid = PidController::new(config(0.0, 10.0, 10.0));
        assert_eq!(pid.update(100.0, 150.0, 0.0), 0.0);
        assert_eq!(pid.state().integral, 0.0);
    }

    #[test]
    fn test_derivative_on_error() {
        let mut pid = PidController::new(config(0.0, 0.0, 2.0));
        pid.update(100.0, 150.0, 0.5);
        // Error grew from 50 to 60 over 0.5 s
        assert_eq!(pid.update(90.0, 150.0, 0.5), 40.0);
    }

    #[test]
    fn test_nan_holds_output() {
        let mut pid = PidController::new(config(100.0, 1.0, 0.0));
        pid.update(140.0, 150.0, 0.1);
        let before = pid.state();
        assert_eq!(pid.update(f32::NAN, 150.0, 0.1), before.output);
        assert_eq!(pid.state().integral, before.integral);
    }

    #[test]
    fn test_reset() {
        let mut pid = PidController::new(config(100.0, 1.0, 0.0));
        pid.update(140.0, 150.0, 0.1);
        pid.reset();
        assert_eq!(pid.state(), ControllerState::default());
    }

    #[test]
    fn test_from_gains() {
        let cfg = PidConfig::from_gains(&PidGains::default(), 9_600.0);
        assert_eq!(cfg.output_range, 9_600.0);
        assert_eq!(cfg.kp, PidGains::default().kp);
    }
}
