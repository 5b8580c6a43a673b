//! Feedback controller and compensation traits

/// Closed-loop controller producing a bounded output
///
/// Output units are whatever the [`Compensation`] downstream expects; in
/// this firmware that is microseconds of conduction per half-cycle.
pub trait FeedbackController {
    /// Run one update and return the new output
    ///
    /// `dt_s` is the time since the previous update in seconds. The result
    /// is always within `[0, output_range()]`.
    fn update(&mut self, measured: f32, setpoint: f32, dt_s: f32) -> f32;

    /// Output from the last update
    fn output(&self) -> f32;

    /// Upper output bound
    fn output_range(&self) -> f32;

    /// Clear accumulated state
    fn reset(&mut self);
}

/// Linearising map from controller output to conduction time
///
/// Monotonic non-decreasing in `raw_output`, precomputed and immutable.
pub trait Compensation {
    /// Conduction time (µs) for `raw_output` in `[0, output_range]`
    fn compensate(&self, raw_output: f32) -> u32;
}

impl<C: Compensation + ?Sized> Compensation for &C {
    fn compensate(&self, raw_output: f32) -> u32 {
        (**self).compensate(raw_output)
    }
}
