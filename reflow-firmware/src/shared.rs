//! State shared between tasks
//!
//! Every task reaches the oven through this one static. The facade is
//! built from atomics, so no mutex or channel sits in the firing path.

use reflow_core::OvenController;

/// Process-wide oven controller
pub static OVEN: OvenController = OvenController::new();
