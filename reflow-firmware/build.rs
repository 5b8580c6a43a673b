//! Build script for reflow-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates oven.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Must match `reflow_core::profile::MAX_SEGMENTS`
const MAX_SEGMENTS: usize = 16;

/// Must match `reflow_hal_rp2040::pio::MAX_FIELD_TICKS`
const MAX_FIELD_TICKS: i64 = 0xFFFF;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate oven.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=oven.toml");

    let config_path = Path::new("oven.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: oven.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds oven.toml from the reflow-firmware          ║\n\
            ║  directory. Please create one there.                             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => panic!("\nERROR: Failed to read oven.toml: {}\n", e),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in oven.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();
    validate_timing(&config, &mut errors);
    validate_pid(&config, &mut errors);
    validate_segments(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid values in oven.toml                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=oven.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn integer(table: &toml::Value, key: &str) -> Option<i64> {
    table.get(key).and_then(toml::Value::as_integer)
}

fn number(table: &toml::Value, key: &str) -> Option<f64> {
    match table.get(key) {
        Some(toml::Value::Float(f)) => Some(*f),
        Some(toml::Value::Integer(i)) => Some(*i as f64),
        _ => None,
    }
}

/// Check the phase-angle window fits the half-cycle
fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(timing) = config.get("timing") else {
        return;
    };

    let half = integer(timing, "half_cycle_us").unwrap_or(10_000);
    let min = integer(timing, "min_phase_angle_us").unwrap_or(200);
    let max = integer(timing, "max_phase_angle_us").unwrap_or(9_600);
    let latch = integer(timing, "ssr_latch_us").unwrap_or(150);
    let clock = integer(timing, "timer_clock_hz").unwrap_or(1_000_000);

    if min > max || max > half {
        errors.push("[timing] need min_phase_angle_us <= max <= half_cycle_us".into());
    }
    if latch <= 0 || latch > min {
        errors.push("[timing] ssr_latch_us must be in 1..=min_phase_angle_us".into());
    }
    if half.saturating_mul(clock) / 1_000_000 > MAX_FIELD_TICKS {
        errors.push("[timing] half_cycle_us exceeds 65535 ticks at timer_clock_hz".into());
    }
    if integer(timing, "sample_interval_ms").is_some_and(|v| v < 100) {
        errors.push("[timing] sample_interval_ms must be at least 100".into());
    }
    if integer(timing, "state_interval_ms").is_some_and(|v| v < 500) {
        errors.push("[timing] state_interval_ms must be at least 500".into());
    }
}

fn validate_pid(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(pid) = config.get("pid") else {
        return;
    };
    for key in ["kp", "ki", "kd", "integral_cap"] {
        if number(pid, key).is_some_and(|v| v < 0.0) {
            errors.push(format!("[pid] {} must not be negative", key));
        }
    }
}

fn validate_segments(config: &toml::Value, errors: &mut Vec<String>) {
    let segments = match config.get("segment") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[segment] must hold [segment.<name>] tables".into());
            return;
        }
        None => {
            println!("cargo:warning=oven.toml has no segments; the default profile is used");
            return;
        }
    };

    if segments.len() > MAX_SEGMENTS {
        errors.push(format!("at most {} segments are supported", MAX_SEGMENTS));
    }

    for (name, segment) in segments {
        if number(segment, "target_c").is_none() {
            errors.push(format!("[segment.{}] missing 'target_c'", name));
        }
        match integer(segment, "min_dwell_ms") {
            Some(ms) if ms >= 0 && ms <= i64::from(u32::MAX) => {}
            Some(_) => errors.push(format!("[segment.{}] min_dwell_ms out of range", name)),
            None => errors.push(format!("[segment.{}] missing 'min_dwell_ms'", name)),
        }
    }
}
