//! Operating mode state machine
//!
//! Defines the authoritative operating modes of the oven and the events
//! that move between them. The transition function is explicit, finite and
//! total; unrecognised raw mode values decode to [`OperatingMode::Error`].

pub mod events;
pub mod machine;

pub use events::ModeEvent;
pub use machine::{OperatingMode, OvenError};
