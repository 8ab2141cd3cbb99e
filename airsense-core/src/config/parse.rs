//! Minimal TOML reader for the sampler configuration
//!
//! Handles only the subset `airsense.toml` uses; it is not a TOML
//! implementation.
//!
//! Supported:
//! - `[sampler]` and `[sensor]` section headers
//! - `key = value` pairs with strings, integers (decimal or `0x` hex)
//!   and floats
//! - Comments (`# ...`), also after a value
//!
//! Keys not listed below are rejected so typos do not silently fall back to
//! defaults.

use crate::fusion::SampleRate;

use super::types::{PersistPolicy, SamplerConfig};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in the current section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Line is neither a header, a pair nor a comment
    Syntax,
    /// Parsed configuration failed validation
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Sampler,
    Sensor,
}

/// Parse TOML text into a [`SamplerConfig`]
///
/// Missing keys keep their [`Default`] value.
pub fn parse_config(input: &str) -> Result<SamplerConfig, ParseError> {
    let mut config = SamplerConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header.strip_suffix(']').ok_or(ParseError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::Syntax)?;
        apply_value(section, key, value, &mut config)?;
    }

    if !config.is_valid() {
        return Err(ParseError::Invalid);
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "sampler" => Ok(Section::Sampler),
        "sensor" => Ok(Section::Sensor),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut SamplerConfig,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Sampler, "sample_rate") => {
            config.sample_rate = parse_sample_rate(parse_string(value)?)?;
        }
        (Section::Sampler, "temperature_offset") => {
            config.temperature_offset_c = parse_float(value)?;
        }
        (Section::Sampler, "save_interval") => {
            config.save_interval_periods = parse_int(value)?;
        }
        (Section::Sampler, "on_save_failure") => {
            config.persist_policy = parse_persist_policy(parse_string(value)?)?;
        }
        (Section::Sensor, "address") => {
            config.sensor_address = parse_int::<u32>(value)?
                .try_into()
                .map_err(|_| ParseError::InvalidValue)?;
        }
        (Section::Sensor, "ambient_temperature") => {
            config.ambient_temp_c = parse_int::<i32>(value)?
                .try_into()
                .map_err(|_| ParseError::InvalidValue)?;
        }
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Drop a trailing comment unless the `#` sits inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_string(value: &str) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)
}

/// Parse an integer, accepting `0x` hex and `_` separators
fn parse_int<T: TryFrom<i64>>(value: &str) -> Result<T, ParseError> {
    let mut digits: heapless::String<24> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    let digits = digits.as_str();

    let (negative, body) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits.strip_prefix('+').unwrap_or(digits)),
    };

    let magnitude = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => body.parse::<i64>(),
    }
    .map_err(|_| ParseError::InvalidValue)?;

    let signed = if negative { -magnitude } else { magnitude };
    T::try_from(signed).map_err(|_| ParseError::InvalidValue)
}

fn parse_float(value: &str) -> Result<f32, ParseError> {
    let parsed: f32 = value.parse().map_err(|_| ParseError::InvalidValue)?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(ParseError::InvalidValue)
    }
}

fn parse_sample_rate(value: &str) -> Result<SampleRate, ParseError> {
    match value {
        "disabled" => Ok(SampleRate::Disabled),
        "ulp" => Ok(SampleRate::Ulp),
        "lp" => Ok(SampleRate::Lp),
        "cont" | "continuous" => Ok(SampleRate::Continuous),
        "scan" => Ok(SampleRate::Scan),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_persist_policy(value: &str) -> Result<PersistPolicy, ParseError> {
    match value {
        "halt" => Ok(PersistPolicy::Halt),
        "retry" => Ok(PersistPolicy::Retry),
        "ignore" => Ok(PersistPolicy::Ignore),
        _ => Err(ParseError::InvalidValue),
    }
}
