//! Reflow profiles
//!
//! A profile is an ordered list of segments (target temperature plus a
//! minimum dwell). The [`ProfileRunner`] walks it while the oven is in
//! Reflow.

pub mod runner;
pub mod segment;

pub use runner::{ProfileEvent, ProfileRunner};
pub use segment::{CursorStart, Profile, ProfileCursor, ProfileError, ProfileSegment, MAX_SEGMENTS};
