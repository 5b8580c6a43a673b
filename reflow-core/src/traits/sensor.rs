//! Thermocouple sensor trait

use core::ops::BitOr;

/// Status flags reported by a thermocouple converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorStatus(u8);

impl SensorStatus {
    /// No flags set
    pub const EMPTY: Self = Self(0);
    /// A new temperature conversion is ready
    pub const FRESH_SAMPLE: Self = Self(1 << 0);
    /// A burst of conversions finished
    pub const BURST_COMPLETE: Self = Self(1 << 1);

    /// Build from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if every flag in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SensorStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Trait for thermocouple converters
///
/// The converter samples on its own schedule; the caller polls the status,
/// reads when a fresh sample is flagged, then clears the flag.
pub trait ThermocoupleSensor {
    /// Bus or device error
    type Error;

    /// Read the status flags
    fn poll_status(&mut self) -> Result<SensorStatus, Self::Error>;

    /// Read the hot-junction temperature (°C)
    fn read_temperature(&mut self) -> Result<f32, Self::Error>;

    /// Clear the given status flags
    fn clear_status(&mut self, flags: SensorStatus) -> Result<(), Self::Error>;
}
