//! Controller facade

pub mod controller;

pub use controller::{OvenController, OvenStatus};
