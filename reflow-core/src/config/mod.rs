//! Configuration types
//!
//! Board-agnostic configuration for timing, control gains, safety limits
//! and the reflow profile. Everything here is plain data; validation is
//! explicit so a board can reject a bad config before arming hardware.

pub mod timing;
pub mod types;

pub use timing::*;
pub use types::*;
