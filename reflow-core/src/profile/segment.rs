//! Profile segments and the ordered profile sequence

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of segments in one profile
pub const MAX_SEGMENTS: usize = 16;

/// Profile construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileError {
    /// Profile already holds [`MAX_SEGMENTS`] segments
    Full,
}

/// One phase of a reflow profile
///
/// The oven holds `target_c` as its setpoint for at least `min_dwell_ms`
/// before moving on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileSegment {
    target_c: f32,
    min_dwell_ms: u32,
}

impl ProfileSegment {
    /// Create a segment
    pub const fn new(target_c: f32, min_dwell_ms: u32) -> Self {
        Self {
            target_c,
            min_dwell_ms,
        }
    }

    /// Setpoint for this segment (°C)
    pub const fn target_c(&self) -> f32 {
        self.target_c
    }

    /// Minimum time to hold the setpoint (ms)
    pub const fn min_dwell_ms(&self) -> u32 {
        self.min_dwell_ms
    }
}

/// Where a new cursor starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CursorStart {
    /// First appended segment, walking forward
    Head,
    /// Last appended segment, walking backward
    Tail,
}

/// Ordered, fixed-capacity sequence of segments
///
/// Built once at start-up and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Profile {
    segments: Vec<ProfileSegment, MAX_SEGMENTS>,
}

impl Profile {
    /// Create an empty profile
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Build a profile from a slice of segments
    pub fn from_segments(segments: &[ProfileSegment]) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        for segment in segments {
            profile.append(*segment)?;
        }
        Ok(profile)
    }

    /// Lead-free paste profile: preheat, soak, reflow, cooldown
    pub fn standard() -> Self {
        let mut segments = Vec::new();
        for target_c in [160.0, 190.0, 230.0, 60.0] {
            // Capacity is well above four
            let _ = segments.push(ProfileSegment::new(target_c, 60_000));
        }
        Self { segments }
    }

    /// Append a segment at the tail
    pub fn append(&mut self, segment: ProfileSegment) -> Result<(), ProfileError> {
        self.segments
            .push(segment)
            .map_err(|_| ProfileError::Full)
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the profile has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in insertion order
    pub fn segments(&self) -> &[ProfileSegment] {
        &self.segments
    }

    /// Sum of all minimum dwell times (ms)
    pub fn total_dwell_ms(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| u64::from(s.min_dwell_ms))
            .sum()
    }

    /// Start a single-pass traversal
    pub fn cursor(&self, start: CursorStart) -> ProfileCursor<'_> {
        ProfileCursor {
            remaining: &self.segments,
            start,
        }
    }
}

/// Forward-only, single-pass traversal over a profile
///
/// Once exhausted it stays exhausted; create a new cursor to restart.
#[derive(Debug, Clone)]
pub struct ProfileCursor<'a> {
    remaining: &'a [ProfileSegment],
    start: CursorStart,
}

impl Iterator for ProfileCursor<'_> {
    type Item = ProfileSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let (segment, rest) = match self.start {
            CursorStart::Head => self.remaining.split_first()?,
            CursorStart::Tail => self.remaining.split_last()?,
        };
        self.remaining = rest;
        Some(*segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining.len(), Some(self.remaining.len()))
    }
}

impl ExactSizeIterator for ProfileCursor<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> Profile {
        Profile::from_segments(&[
            ProfileSegment::new(100.0, 10),
            ProfileSegment::new(200.0, 20),
            ProfileSegment::new(50.0, 30),
        ])
        .unwrap()
    }

    #[test]
    fn test_cursor_head_order() {
        let profile = three();
        let mut cursor = profile.cursor(CursorStart::Head);
        assert_eq!(cursor.len(), 3);
        assert_eq!(cursor.next().map(|s| s.target_c()), Some(100.0));
        assert_eq!(cursor.next().map(|s| s.target_c()), Some(200.0));
        assert_eq!(cursor.next().map(|s| s.target_c()), Some(50.0));
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_cursor_tail_order() {
        let profile = three();
        let targets: heapless::Vec<f32, 4> = profile
            .cursor(CursorStart::Tail)
            .map(|s| s.target_c())
            .collect();
        assert_eq!(targets.as_slice(), &[50.0, 200.0, 100.0]);
    }

    #[test]
    fn test_cursor_yields_n_then_none() {
        for n in 0..=MAX_SEGMENTS {
            let mut profile = Profile::new();
            for i in 0..n {
                profile
                    .append(ProfileSegment::new(i as f32, 1))
                    .unwrap();
            }
            let mut cursor = profile.cursor(CursorStart::Head);
            for _ in 0..n {
                assert!(cursor.next().is_some());
            }
            assert!(cursor.next().is_none());
        }
    }

    #[test]
    fn test_append_full() {
        let mut profile = Profile::new();
        for _ in 0..MAX_SEGMENTS {
            profile.append(ProfileSegment::new(1.0, 1)).unwrap();
        }
        assert_eq!(
            profile.append(ProfileSegment::new(1.0, 1)),
            Err(ProfileError::Full)
        );
        assert_eq!(profile.len(), MAX_SEGMENTS);
    }

    #[test]
    fn test_standard_profile() {
        let profile = Profile::standard();
        assert_eq!(profile.len(), 4);
        assert_eq!(profile.total_dwell_ms(), 240_000);
        assert_eq!(profile.segments()[2].target_c(), 230.0);
    }
}
