//! Temperature sensor drivers

pub mod mcp9600;

pub use mcp9600::{Mcp9600, Mcp9600Config, Mcp9600Error, ThermocoupleType};
