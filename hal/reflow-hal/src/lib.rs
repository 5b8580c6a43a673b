//! Reflow Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits that the control core
//! drives. Chip-specific crates (RP2040, ...) implement them so the same
//! control logic runs on any board that can time an SSR against the mains
//! zero-crossing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  reflow-core (firing pipeline)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  reflow-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  reflow-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`phase::PhaseTimer`] - zero-cross anchored SSR firing window

#![no_std]
#![deny(unsafe_code)]

pub mod phase;

pub use phase::{FiringWindow, PhaseTimer};
