//! Phase-angle compensation lookup
//!
//! Power delivered into a resistive load by phase-angle control is not
//! linear in the firing delay. For a delay angle `α` (radians into the
//! half-cycle) the delivered fraction of full power is
//!
//! ```text
//! P(α) = (π - α + sin(2α) / 2) / π
//! ```
//!
//! The table inverts this once at start-up so that a linear controller
//! output maps to a linear share of heater power.

use core::f32::consts::PI;

use micromath::F32Ext;
use reflow_core::traits::Compensation;

/// Bisection steps per entry; resolution is π / 2^24
const BISECT_STEPS: u32 = 24;

/// Delivered power fraction for delay angle `alpha`
fn power_fraction(alpha: f32) -> f32 {
    (PI - alpha + F32Ext::sin(2.0 * alpha) / 2.0) / PI
}

/// Delay angle delivering `fraction` of full power
fn delay_for(fraction: f32) -> f32 {
    let (mut lo, mut hi) = (0.0f32, PI);
    for _ in 0..BISECT_STEPS {
        let mid = (lo + hi) / 2.0;
        if power_fraction(mid) > fraction {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

/// Precomputed output-to-conduction-time table with `N` entries
#[derive(Debug, Clone)]
pub struct PhaseAngleTable<const N: usize> {
    /// Conduction time (µs) for output `i * output_range / (N - 1)`
    conduction_us: [u32; N],
    output_range: f32,
}

impl<const N: usize> PhaseAngleTable<N> {
    /// Build the table for a mains half-cycle of `half_cycle_us`
    pub fn new(half_cycle_us: u32, output_range: f32) -> Self {
        let last = N.saturating_sub(1).max(1);
        let mut conduction_us = [0u32; N];
        let mut floor = 0;

        for (i, slot) in conduction_us.iter_mut().enumerate() {
            let us = if i == 0 {
                0
            } else if i == last {
                half_cycle_us
            } else {
                let alpha = delay_for(i as f32 / last as f32);
                let share = (1.0 - alpha / PI).max(0.0).min(1.0);
                (share * half_cycle_us as f32 + 0.5) as u32
            };
            // Bisection noise must not break monotonicity
            floor = us.max(floor).min(half_cycle_us);
            *slot = floor;
        }

        Self {
            conduction_us,
            output_range,
        }
    }

    /// Raw table entries
    pub fn entries(&self) -> &[u32; N] {
        &self.conduction_us
    }

    fn index(&self, raw_output: f32) -> usize {
        let last = N.saturating_sub(1);
        if raw_output.is_nan() || raw_output <= 0.0 || self.output_range <= 0.0 {
            return 0;
        }
        let pos = raw_output / self.output_range * last as f32 + 0.5;
        (pos as usize).min(last)
    }
}

impl<const N: usize> Compensation for PhaseAngleTable<N> {
    fn compensate(&self, raw_output: f32) -> u32 {
        self.conduction_us
            .get(self.index(raw_output))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reflow_core::config::TimingConfig;
    use reflow_core::firing::firing_window;

    #[test]
    fn test_endpoints() {
        let table = PhaseAngleTable::<101>::new(10_000, 10_000.0);
        assert_eq!(table.compensate(0.0), 0);
        assert_eq!(table.compensate(10_000.0), 10_000);
        assert_eq!(table.compensate(-5.0), 0);
        assert_eq!(table.compensate(50_000.0), 10_000);
        assert_eq!(table.compensate(f32::NAN), 0);
    }

    #[test]
    fn test_monotonic() {
        let table = PhaseAngleTable::<256>::new(8_333, 9_600.0);
        for pair in table.entries().windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_half_power_is_half_cycle() {
        let table = PhaseAngleTable::<101>::new(10_000, 100.0);
        let mid = table.compensate(50.0);
        assert!((4_980..=5_020).contains(&mid), "mid = {}", mid);
    }

    #[test]
    fn test_nonlinear_quarter_power() {
        let table = PhaseAngleTable::<101>::new(10_000, 100.0);
        // The tail of the sine carries little energy, so a quarter of the
        // power needs more than a quarter of the half-cycle
        let quarter = table.compensate(25.0);
        assert!(quarter > 2_500 && quarter < 5_000, "quarter = {}", quarter);
    }

    proptest! {
        #[test]
        fn window_property(output in 0.0f32..=10_000.0, clock in 1_000_000u32..=125_000_000) {
            let timing = TimingConfig {
                timer_clock_hz: clock,
                ..Default::default()
            };
            let table = PhaseAngleTable::<256>::new(timing.half_cycle_us, 10_000.0);
            let window = firing_window(output, &table, &timing);

            prop_assert!(window.on_ticks < window.off_ticks);
            prop_assert_eq!(window.pulse_ticks(), timing.latch_ticks());
            // Conduction stays inside the configured phase angle range
            let min_on = timing.us_to_ticks(timing.half_cycle_us - timing.max_phase_angle_us);
            let max_on = timing.us_to_ticks(timing.half_cycle_us - timing.min_phase_angle_us);
            prop_assert!(window.on_ticks >= min_on && window.on_ticks <= max_on);
        }
    }
}
