//! Profile-following state machine
//!
//! Evaluated on the state cadence by the supervisory task. Walks the
//! profile with a cursor while the oven is in Reflow and drives the
//! active target temperature.

use super::segment::{CursorStart, Profile, ProfileCursor, ProfileSegment};
use crate::oven::OvenController;
use crate::state::{OperatingMode, OvenError};

/// Notable outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileEvent {
    /// Entered Reflow and loaded the first segment
    Started { target_c: f32 },
    /// Dwell elapsed, moved to the next segment
    SegmentAdvanced { index: usize, target_c: f32 },
    /// All segments done, back to Idle
    Completed,
    /// Start requested with no segments, back to Idle
    EmptyProfile,
    /// Run left Reflow before completing (abort or clear)
    Interrupted(OperatingMode),
    /// Mode byte held an unknown value; oven aborted
    CorruptMode(u8),
}

/// Executes a profile against the oven facade
///
/// Holds the cursor and segment timing between evaluations. The cursor
/// exists only while a run is in progress.
#[derive(Debug)]
pub struct ProfileRunner<'a> {
    profile: &'a Profile,
    cursor: Option<ProfileCursor<'a>>,
    segment: Option<ProfileSegment>,
    segment_index: usize,
    segment_start_ms: u64,
    /// Run generation last entered; a new `start()` from Idle bumps it
    entered_run: Option<u32>,
}

impl<'a> ProfileRunner<'a> {
    /// Create a runner for `profile`
    pub fn new(profile: &'a Profile) -> Self {
        Self {
            profile,
            cursor: None,
            segment: None,
            segment_index: 0,
            segment_start_ms: 0,
            entered_run: None,
        }
    }

    /// Profile being executed
    pub fn profile(&self) -> &'a Profile {
        self.profile
    }

    /// Segment currently held, if a run is in progress
    pub fn active_segment(&self) -> Option<(usize, ProfileSegment)> {
        self.segment.map(|s| (self.segment_index, s))
    }

    /// Run one state evaluation
    pub fn evaluate(&mut self, oven: &OvenController, now_ms: u64) -> Option<ProfileEvent> {
        let (mode, run) = oven.run_state();
        match mode {
            OperatingMode::Reflow => {
                if self.entered_run != Some(run) || self.segment.is_none() {
                    self.entered_run = Some(run);
                    Some(self.enter(oven, now_ms))
                } else {
                    self.step(oven, now_ms)
                }
            }
            mode @ (OperatingMode::Idle | OperatingMode::Abort) => {
                oven.set_target(0.0);
                self.park().then_some(ProfileEvent::Interrupted(mode))
            }
            OperatingMode::Error => {
                let raw = oven.raw_mode();
                oven.abort(OvenError::ErroneousState);
                oven.set_target(0.0);
                self.park();
                Some(ProfileEvent::CorruptMode(raw))
            }
        }
    }

    /// Fresh cursor from the head, first segment loaded
    fn enter(&mut self, oven: &OvenController, now_ms: u64) -> ProfileEvent {
        let mut cursor = self.profile.cursor(CursorStart::Head);
        match cursor.next() {
            Some(first) => {
                self.cursor = Some(cursor);
                if self.load(oven, 0, first, now_ms) {
                    ProfileEvent::Started {
                        target_c: first.target_c(),
                    }
                } else {
                    ProfileEvent::Interrupted(oven.mode())
                }
            }
            None => {
                self.finish(oven);
                ProfileEvent::EmptyProfile
            }
        }
    }

    fn step(&mut self, oven: &OvenController, now_ms: u64) -> Option<ProfileEvent> {
        let segment = self.segment?;
        let elapsed = now_ms.saturating_sub(self.segment_start_ms);
        if elapsed <= u64::from(segment.min_dwell_ms()) {
            return None;
        }

        match self.cursor.as_mut().and_then(Iterator::next) {
            Some(next) => {
                let index = self.segment_index + 1;
                if !self.load(oven, index, next, now_ms) {
                    return Some(ProfileEvent::Interrupted(oven.mode()));
                }
                Some(ProfileEvent::SegmentAdvanced {
                    index,
                    target_c: next.target_c(),
                })
            }
            None => {
                self.finish(oven);
                Some(ProfileEvent::Completed)
            }
        }
    }

    /// Hold `segment` and publish its target
    ///
    /// Parks and returns false when the run was aborted after `evaluate`
    /// read the mode.
    fn load(
        &mut self,
        oven: &OvenController,
        index: usize,
        segment: ProfileSegment,
        now_ms: u64,
    ) -> bool {
        self.segment = Some(segment);
        self.segment_index = index;
        self.segment_start_ms = now_ms;
        if oven.set_run_target(segment.target_c()) {
            true
        } else {
            self.park();
            false
        }
    }

    /// Target off, Reflow -> Idle unless something else already moved the mode
    fn finish(&mut self, oven: &OvenController) {
        self.park();
        oven.set_target(0.0);
        oven.finish_run();
    }

    /// Drop the cursor; returns whether a run was in progress
    fn park(&mut self) -> bool {
        self.cursor = None;
        self.segment.take().is_some()
    }
}
