//! MCP9600 thermocouple EMF converter (I²C)
//!
//! The MCP9600 digitises the thermocouple EMF, compensates the cold
//! junction internally and reports the hot-junction temperature in
//! 1/16 °C steps.
//!
//! # Register access
//!
//! A register is selected by writing its pointer byte, then read back
//! most-significant byte first. Writing a register is the pointer byte
//! followed by the data.
//!
//! # Status flags
//!
//! Bit 6 (`TH_UPDATE`) is set each time a new hot-junction conversion
//! lands and stays set until cleared by writing it as zero.

use embedded_hal::i2c::I2c;
use reflow_core::traits::{SensorStatus, ThermocoupleSensor};

/// MCP9600 register pointers
pub mod reg {
    /// Hot-junction temperature
    pub const HOT_JUNCTION: u8 = 0x00;
    /// Junction temperature delta
    pub const DELTA: u8 = 0x01;
    /// Cold-junction temperature
    pub const COLD_JUNCTION: u8 = 0x02;
    /// Status flags
    pub const STATUS: u8 = 0x04;
    /// Thermocouple type and filter
    pub const SENSOR_CONFIG: u8 = 0x05;
    /// Resolution, burst and shutdown mode
    pub const DEVICE_CONFIG: u8 = 0x06;
    /// Device ID and revision
    pub const DEVICE_ID: u8 = 0x20;
}

/// Status register bits
pub mod status {
    /// Burst conversion complete
    pub const BURST_COMPLETE: u8 = 1 << 7;
    /// New hot-junction conversion available
    pub const TH_UPDATE: u8 = 1 << 6;
}

/// Default 7-bit address (ADDR pin tied to ground)
pub const DEFAULT_ADDRESS: u8 = 0x60;

/// Device ID of the MCP9600
pub const MCP9600_ID: u8 = 0x40;
/// Device ID of the MCP9601 (register compatible)
pub const MCP9601_ID: u8 = 0x41;

/// LSB of the temperature registers (°C)
const DEGREES_PER_LSB: f32 = 0.0625;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mcp9600Error<E> {
    /// Bus transaction failed
    I2c(E),
    /// Device ID did not match an MCP960x
    UnknownDevice(u8),
}

/// Thermocouple type, as encoded in the sensor configuration register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermocoupleType {
    #[default]
    K = 0b000,
    J = 0b001,
    T = 0b010,
    N = 0b011,
    S = 0b100,
    E = 0b101,
    B = 0b110,
    R = 0b111,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mcp9600Config {
    /// 7-bit I²C address
    pub address: u8,
    /// Attached thermocouple
    pub thermocouple: ThermocoupleType,
    /// Digital filter coefficient (0 = off, 7 = maximum)
    pub filter: u8,
}

impl Default for Mcp9600Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            thermocouple: ThermocoupleType::K,
            filter: 0,
        }
    }
}

/// MCP9600 driver
pub struct Mcp9600<I2C> {
    i2c: I2C,
    config: Mcp9600Config,
}

impl<I2C: I2c> Mcp9600<I2C> {
    /// Create a driver; no bus traffic until [`init`](Self::init)
    pub fn new(i2c: I2C, config: Mcp9600Config) -> Self {
        Self { i2c, config }
    }

    /// Probe the device ID and program the thermocouple type
    ///
    /// Leaves the converter in normal (continuous) mode with 18-bit ADC
    /// resolution. Returns the silicon revision byte.
    pub fn init(&mut self) -> Result<u8, Mcp9600Error<I2C::Error>> {
        let mut id = [0u8; 2];
        self.read_register(reg::DEVICE_ID, &mut id)
            .map_err(Mcp9600Error::I2c)?;
        if id[0] != MCP9600_ID && id[0] != MCP9601_ID {
            return Err(Mcp9600Error::UnknownDevice(id[0]));
        }

        let sensor = ((self.config.thermocouple as u8) << 4) | (self.config.filter & 0x07);
        self.write_register(reg::SENSOR_CONFIG, sensor)
            .map_err(Mcp9600Error::I2c)?;
        // Cold junction 0.0625 °C, ADC 18 bit, single-sample burst, normal mode
        self.write_register(reg::DEVICE_CONFIG, 0x00)
            .map_err(Mcp9600Error::I2c)?;

        Ok(id[1])
    }

    /// Hot-junction temperature (°C)
    pub fn hot_junction(&mut self) -> Result<f32, I2C::Error> {
        self.read_temperature_register(reg::HOT_JUNCTION)
    }

    /// Cold-junction (ambient) temperature (°C)
    pub fn cold_junction(&mut self) -> Result<f32, I2C::Error> {
        self.read_temperature_register(reg::COLD_JUNCTION)
    }

    /// Hot minus cold junction (°C)
    pub fn delta(&mut self) -> Result<f32, I2C::Error> {
        self.read_temperature_register(reg::DELTA)
    }

    /// Raw status register
    pub fn status(&mut self) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.read_register(reg::STATUS, &mut buf)?;
        Ok(buf[0])
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_temperature_register(&mut self, register: u8) -> Result<f32, I2C::Error> {
        let mut buf = [0u8; 2];
        self.read_register(register, &mut buf)?;
        Ok(raw_to_celsius(buf))
    }

    fn read_register(&mut self, register: u8, buf: &mut [u8]) -> Result<(), I2C::Error> {
        self.i2c.write_read(self.config.address, &[register], buf)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.config.address, &[register, value])
    }
}

/// Convert a big-endian two's complement reading to °C
fn raw_to_celsius(raw: [u8; 2]) -> f32 {
    f32::from(i16::from_be_bytes(raw)) * DEGREES_PER_LSB
}

fn to_sensor_status(raw: u8) -> SensorStatus {
    let mut flags = SensorStatus::EMPTY;
    if raw & status::TH_UPDATE != 0 {
        flags = flags | SensorStatus::FRESH_SAMPLE;
    }
    if raw & status::BURST_COMPLETE != 0 {
        flags = flags | SensorStatus::BURST_COMPLETE;
    }
    flags
}

fn to_register_bits(flags: SensorStatus) -> u8 {
    let mut bits = 0;
    if flags.contains(SensorStatus::FRESH_SAMPLE) {
        bits |= status::TH_UPDATE;
    }
    if flags.contains(SensorStatus::BURST_COMPLETE) {
        bits |= status::BURST_COMPLETE;
    }
    bits
}

impl<I2C: I2c> ThermocoupleSensor for Mcp9600<I2C> {
    type Error = I2C::Error;

    fn poll_status(&mut self) -> Result<SensorStatus, Self::Error> {
        self.status().map(to_sensor_status)
    }

    fn read_temperature(&mut self) -> Result<f32, Self::Error> {
        self.hot_junction()
    }

    fn clear_status(&mut self, flags: SensorStatus) -> Result<(), Self::Error> {
        let current = self.status()?;
        self.write_register(reg::STATUS, current & !to_register_bits(flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Register file behind a fake bus
    struct MockBus {
        regs: [u8; 0x30],
        pointer: usize,
        fail: bool,
    }

    impl MockBus {
        fn new() -> Self {
            let mut regs = [0u8; 0x30];
            regs[reg::DEVICE_ID as usize] = MCP9600_ID;
            regs[reg::DEVICE_ID as usize + 1] = 0x12;
            Self {
                regs,
                pointer: 0,
                fail: false,
            }
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(address, DEFAULT_ADDRESS);
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.pointer = bytes[0] as usize;
                        for (i, b) in bytes[1..].iter().enumerate() {
                            self.regs[self.pointer + i] = *b;
                        }
                    }
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.regs[self.pointer + i];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_raw_conversion() {
        assert_eq!(raw_to_celsius([0x0F, 0xA0]), 250.0);
        assert_eq!(raw_to_celsius([0x00, 0x01]), 0.0625);
        assert_eq!(raw_to_celsius([0xFF, 0xF0]), -1.0);
    }

    #[test]
    fn test_init_programs_type() {
        let mut sensor = Mcp9600::new(
            MockBus::new(),
            Mcp9600Config {
                thermocouple: ThermocoupleType::J,
                filter: 3,
                ..Default::default()
            },
        );
        assert_eq!(sensor.init(), Ok(0x12));
        let bus = sensor.release();
        assert_eq!(bus.regs[reg::SENSOR_CONFIG as usize], 0b0001_0011);
    }

    #[test]
    fn test_unknown_device() {
        let mut bus = MockBus::new();
        bus.regs[reg::DEVICE_ID as usize] = 0x99;
        let mut sensor = Mcp9600::new(bus, Mcp9600Config::default());
        assert_eq!(sensor.init(), Err(Mcp9600Error::UnknownDevice(0x99)));
    }

    #[test]
    fn test_fresh_sample_cycle() {
        let mut bus = MockBus::new();
        bus.regs[reg::STATUS as usize] = status::TH_UPDATE | status::BURST_COMPLETE | 0x01;
        bus.regs[reg::HOT_JUNCTION as usize] = 0x0F;
        bus.regs[reg::HOT_JUNCTION as usize + 1] = 0xA0;
        let mut sensor = Mcp9600::new(bus, Mcp9600Config::default());

        let flags = sensor.poll_status().unwrap();
        assert!(flags.contains(SensorStatus::FRESH_SAMPLE));
        assert!(flags.contains(SensorStatus::BURST_COMPLETE));
        assert_eq!(sensor.read_temperature(), Ok(250.0));

        sensor.clear_status(SensorStatus::FRESH_SAMPLE).unwrap();
        assert!(!sensor
            .poll_status()
            .unwrap()
            .contains(SensorStatus::FRESH_SAMPLE));
        // Other bits untouched
        assert_eq!(sensor.status(), Ok(status::BURST_COMPLETE | 0x01));
    }

    #[test]
    fn test_bus_error() {
        let mut bus = MockBus::new();
        bus.fail = true;
        let mut sensor = Mcp9600::new(bus, Mcp9600Config::default());
        assert_eq!(sensor.poll_status(), Err(ErrorKind::Other));
    }
}
