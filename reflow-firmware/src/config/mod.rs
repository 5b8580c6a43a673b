//! Configuration loading and parsing
//!
//! The oven configuration is embedded at build time from `oven.toml` and
//! parsed by a small no_std reader.

pub mod toml;

pub use toml::{parse_config, FirmwareConfig};
