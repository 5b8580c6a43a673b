//! Embassy async tasks
//!
//! Each task runs independently and talks to the others only through
//! [`crate::shared::OVEN`].

pub mod buttons;
pub mod firing;
pub mod supervisor;

pub use buttons::buttons_task;
pub use firing::{firing_task, TABLE_SIZE};
pub use supervisor::supervisor_task;
