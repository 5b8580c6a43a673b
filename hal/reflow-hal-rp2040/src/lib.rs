//! RP2040-specific HAL for the reflow oven firmware
//!
//! This crate provides RP2040 implementations of the `reflow-hal` traits:
//!
//! - PIO-based zero-cross synchronised SSR firing ([`phase::PioPhaseTimer`])
//! - Pure helpers for clock dividers and FIFO word packing ([`pio`])

#![no_std]

pub mod phase;
pub mod pio;

pub use phase::{PhaseTimerError, PioPhaseTimer};
