//! Board-agnostic control core for the reflow oven firmware
//!
//! This crate contains all control logic that does not depend on a specific
//! board:
//!
//! - Controller facade shared by every calling context ([`oven`])
//! - Profile sequence and the profile-following state machine ([`profile`])
//! - Cadence-gated supervisory task ([`supervisor`])
//! - Zero-cross anchored firing pipeline ([`firing`])
//! - Lock-free cells for cross-context state ([`sync`])
//! - Watchdog-style safety monitoring ([`safety`])
//! - Configuration type definitions ([`config`])
//! - Traits for the external collaborators ([`traits`])

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod firing;
pub mod oven;
pub mod profile;
pub mod safety;
pub mod state;
pub mod supervisor;
pub mod sync;
pub mod traits;

pub use oven::{OvenController, OvenStatus};
pub use state::{ModeEvent, OperatingMode, OvenError};
