//! Minimal TOML reader for the embedded oven configuration
//!
//! Handles only the subset used by `oven.toml`. It does NOT support the
//! full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float)
//! - Hexadecimal integers (`0x60`)
//! - `[section]` and `[segment.<name>]` headers
//! - Comments (# ...)
//!
//! Segments are appended in file order. The first `[segment.*]` header
//! replaces the built-in profile.

use heapless::String as HString;

use reflow_core::config::{ConfigError, OvenConfig};
use reflow_core::profile::{Profile, ProfileSegment};
use reflow_drivers::sensor::{Mcp9600Config, ThermocoupleType};

/// Longest segment name kept while parsing
const MAX_NAME_LEN: usize = 16;

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Key not known in its section
    UnknownKey,
    /// Segment lacks `target_c` or `min_dwell_ms`
    IncompleteSegment,
    /// More segments than a profile holds
    TooManySegments,
    /// Parsed configuration failed validation
    Invalid(ConfigError),
}

/// Everything the firmware reads from `oven.toml`
#[derive(Debug, Clone)]
pub struct FirmwareConfig {
    /// Board-agnostic oven configuration
    pub oven: OvenConfig,
    /// Thermocouple converter settings
    pub sensor: Mcp9600Config,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            oven: OvenConfig::default(),
            sensor: Mcp9600Config::default(),
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    Root,
    Timing,
    Pid,
    Safety,
    Sensor,
    Segment(HString<MAX_NAME_LEN>),
}

/// Segment under construction
#[derive(Debug, Default)]
struct PendingSegment {
    target_c: Option<f32>,
    min_dwell_ms: Option<u32>,
}

/// Parse TOML text into a validated [`FirmwareConfig`]
pub fn parse_config(input: &str) -> Result<FirmwareConfig, ParseError> {
    let mut config = FirmwareConfig::default();
    let mut section = Section::Root;
    let mut pending: Option<PendingSegment> = None;
    let mut profile: Option<Profile> = None;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_segment(&mut pending, &mut profile)?;

            section = parse_section_header(&line[1..line.len() - 1])?;
            if matches!(section, Section::Segment(_)) {
                pending = Some(PendingSegment::default());
            }
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&section, key, value, &mut config, &mut pending)?;
        } else {
            return Err(ParseError::InvalidValue);
        }
    }

    save_segment(&mut pending, &mut profile)?;
    if let Some(profile) = profile {
        config.oven.profile = profile;
    }

    config.oven.validate().map_err(ParseError::Invalid)?;
    Ok(config)
}

/// Parse a section header like "timing" or "segment.soak"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some((kind, name)) = header.split_once('.') {
        if kind.trim() != "segment" || name.trim().is_empty() {
            return Err(ParseError::InvalidSection);
        }
        let name = HString::try_from(name.trim()).map_err(|_| ParseError::InvalidSection)?;
        return Ok(Section::Segment(name));
    }

    match header {
        "timing" => Ok(Section::Timing),
        "pid" => Ok(Section::Pid),
        "safety" => Ok(Section::Safety),
        "sensor" => Ok(Section::Sensor),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parse a decimal or `0x` hexadecimal integer
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let value = value.replace_underscores();
    let raw = match value
        .as_str()
        .strip_prefix("0x")
        .or_else(|| value.as_str().strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.as_str().parse(),
    }
    .map_err(|_| ParseError::InvalidValue)?;
    T::try_from(raw).map_err(|_| ParseError::InvalidValue)
}

/// Parse a float; integers are accepted too
fn parse_float(value: &str) -> Result<f32, ParseError> {
    let value = value.replace_underscores();
    value
        .as_str()
        .parse::<f32>()
        .map_err(|_| ParseError::InvalidValue)
}

/// TOML allows `_` between digits
trait ReplaceUnderscores {
    fn replace_underscores(&self) -> HString<32>;
}

impl ReplaceUnderscores for str {
    fn replace_underscores(&self) -> HString<32> {
        let mut out = HString::new();
        for c in self.chars().filter(|c| *c != '_') {
            // Overlong numbers fail to parse anyway
            if out.push(c).is_err() {
                break;
            }
        }
        out
    }
}

fn parse_thermocouple(value: &str) -> Result<ThermocoupleType, ParseError> {
    match parse_string(value) {
        "K" | "k" => Ok(ThermocoupleType::K),
        "J" | "j" => Ok(ThermocoupleType::J),
        "T" | "t" => Ok(ThermocoupleType::T),
        "N" | "n" => Ok(ThermocoupleType::N),
        "S" | "s" => Ok(ThermocoupleType::S),
        "E" | "e" => Ok(ThermocoupleType::E),
        "B" | "b" => Ok(ThermocoupleType::B),
        "R" | "r" => Ok(ThermocoupleType::R),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Apply a key-value pair to the current section
fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    config: &mut FirmwareConfig,
    pending: &mut Option<PendingSegment>,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::UnknownKey),
        Section::Timing => {
            let timing = &mut config.oven.timing;
            match key {
                "half_cycle_us" => timing.half_cycle_us = parse_int(value)?,
                "zero_cross_delay_us" => timing.zero_cross_delay_us = parse_int(value)?,
                "ssr_latch_us" => timing.ssr_latch_us = parse_int(value)?,
                "min_phase_angle_us" => timing.min_phase_angle_us = parse_int(value)?,
                "max_phase_angle_us" => timing.max_phase_angle_us = parse_int(value)?,
                "timer_clock_hz" => timing.timer_clock_hz = parse_int(value)?,
                "sample_interval_ms" => timing.sample_interval_ms = parse_int(value)?,
                "state_interval_ms" => timing.state_interval_ms = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Pid => {
            let pid = &mut config.oven.pid;
            match key {
                "kp" => pid.kp = parse_float(value)?,
                "ki" => pid.ki = parse_float(value)?,
                "kd" => pid.kd = parse_float(value)?,
                "integral_cap" => pid.integral_cap = parse_float(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Safety => {
            let safety = &mut config.oven.safety;
            match key {
                "max_temperature_c" => safety.max_temperature_c = parse_float(value)?,
                "sample_timeout_ms" => safety.sample_timeout_ms = parse_int(value)?,
                "max_sensor_errors" => safety.max_sensor_errors = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Sensor => {
            let sensor = &mut config.sensor;
            match key {
                "address" => sensor.address = parse_int(value)?,
                "thermocouple" => sensor.thermocouple = parse_thermocouple(value)?,
                "filter" => {
                    let filter: u8 = parse_int(value)?;
                    if filter > 7 {
                        return Err(ParseError::InvalidValue);
                    }
                    sensor.filter = filter;
                }
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Segment(_) => {
            let Some(segment) = pending.as_mut() else {
                return Err(ParseError::InvalidSection);
            };
            match key {
                "target_c" => segment.target_c = Some(parse_float(value)?),
                "min_dwell_ms" => segment.min_dwell_ms = Some(parse_int(value)?),
                _ => return Err(ParseError::UnknownKey),
            }
        }
    }

    Ok(())
}

/// Append the segment under construction to the parsed profile
fn save_segment(
    pending: &mut Option<PendingSegment>,
    profile: &mut Option<Profile>,
) -> Result<(), ParseError> {
    let Some(segment) = pending.take() else {
        return Ok(());
    };
    let (Some(target_c), Some(min_dwell_ms)) = (segment.target_c, segment.min_dwell_ms) else {
        return Err(ParseError::IncompleteSegment);
    };

    profile
        .get_or_insert_with(Profile::new)
        .append(ProfileSegment::new(target_c, min_dwell_ms))
        .map_err(|_| ParseError::TooManySegments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::config::TimingConfig;
    use reflow_core::profile::MAX_SEGMENTS;

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("timing"), Ok(Section::Timing));
        assert_eq!(parse_section_header(" sensor "), Ok(Section::Sensor));
        match parse_section_header("segment.soak").unwrap() {
            Section::Segment(name) => assert_eq!(name.as_str(), "soak"),
            _ => panic!("Wrong section type"),
        }
        assert_eq!(
            parse_section_header("heater.main"),
            Err(ParseError::InvalidSection)
        );
        assert_eq!(parse_section_header("segment."), Err(ParseError::InvalidSection));
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_int::<u8>("0x60"), Ok(0x60));
        assert_eq!(parse_int::<u32>("10_000"), Ok(10_000));
        assert_eq!(parse_int::<u8>("300"), Err(ParseError::InvalidValue));
        assert_eq!(parse_float("230"), Ok(230.0));
        assert_eq!(parse_float("2.5"), Ok(2.5));
        assert_eq!(parse_thermocouple("\"J\""), Ok(ThermocoupleType::J));
        assert_eq!(parse_thermocouple("X"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_inline_comment_stripped() {
        assert_eq!(
            parse_key_value("half_cycle_us = 8333   # 60 Hz"),
            Some(("half_cycle_us", "8333"))
        );
        assert_eq!(
            parse_key_value("thermocouple = \"#K\""),
            Some(("thermocouple", "\"#K\""))
        );
    }

    #[test]
    fn test_embedded_config_parses() {
        let config = parse_config(include_str!("../../oven.toml")).unwrap();
        assert_eq!(config.oven.timing, TimingConfig::default());
        assert_eq!(config.sensor.address, 0x60);
        assert_eq!(config.sensor.filter, 2);

        let targets: heapless::Vec<f32, 4> = config
            .oven
            .profile
            .segments()
            .iter()
            .map(|s| s.target_c())
            .collect();
        assert_eq!(targets.as_slice(), &[160.0, 190.0, 230.0, 60.0]);
    }

    #[test]
    fn test_segments_replace_default_profile() {
        let config = parse_config(
            r#"
[timing]
half_cycle_us = 8333
max_phase_angle_us = 8000

[segment.hold]
target_c = 120
min_dwell_ms = 5000
"#,
        )
        .unwrap();
        assert_eq!(config.oven.timing.half_cycle_us, 8_333);
        assert_eq!(config.oven.profile.len(), 1);
        assert_eq!(config.oven.profile.segments()[0].min_dwell_ms(), 5_000);
    }

    #[test]
    fn test_no_segments_keeps_default_profile() {
        let config = parse_config("[pid]\nkp = 90.0\n").unwrap();
        assert_eq!(config.oven.pid.kp, 90.0);
        assert_eq!(config.oven.profile.len(), Profile::standard().len());
    }

    #[test]
    fn test_incomplete_segment_rejected() {
        let result = parse_config("[segment.a]\ntarget_c = 100.0\n");
        assert_eq!(result.unwrap_err(), ParseError::IncompleteSegment);
    }

    #[test]
    fn test_too_many_segments() {
        let mut text: heapless::String<2048> = heapless::String::new();
        for i in 0..=MAX_SEGMENTS {
            core::fmt::Write::write_fmt(
                &mut text,
                format_args!("[segment.s{}]\ntarget_c = 100\nmin_dwell_ms = 10\n", i),
            )
            .unwrap();
        }
        assert_eq!(
            parse_config(&text).unwrap_err(),
            ParseError::TooManySegments
        );
    }

    #[test]
    fn test_unknown_key_and_invalid_config() {
        assert_eq!(
            parse_config("[pid]\nkx = 1.0\n").unwrap_err(),
            ParseError::UnknownKey
        );
        assert_eq!(
            parse_config("[timing]\nssr_latch_us = 500\n").unwrap_err(),
            ParseError::Invalid(ConfigError::LatchExceedsMinAngle)
        );
    }
}
