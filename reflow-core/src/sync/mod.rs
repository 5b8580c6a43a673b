//! Cross-context shared state
//!
//! The firing trigger runs with interrupt-like preemption while the
//! supervisory task and the facade run on the cooperative control flow.
//! Every value crossing that boundary lives in one of these single-slot
//! atomic cells; there are no plain shared variables.

pub mod cell;

pub use cell::OutputSlot;
pub(crate) use cell::{ErrorCell, F32Cell, ModeCell};
