//! Driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in reflow-core:
//!
//! - Feedback controller (float PID with anti-windup)
//! - Phase-angle compensation table
//! - Thermocouple converter (MCP9600 over I²C)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod heater;
pub mod sensor;
