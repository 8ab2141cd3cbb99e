//! Build script for airsense-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates airsense.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

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

/// Validate airsense.toml so a broken file fails the build, not the boot
fn validate_config() {
    println!("cargo:rerun-if-changed=airsense.toml");

    let config_path = Path::new("airsense.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: airsense.toml not found!                                 ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds airsense.toml as its default configuration. ║\n\
            ║  Please create one in the airsense-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read airsense.toml                             ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            report_errors("Invalid TOML syntax in airsense.toml", &format_error_lines(&e.to_string()));
        }
    };

    let mut errors = Vec::new();
    validate_sampler(&config, &mut errors);
    validate_sensor(&config, &mut errors);

    if !errors.is_empty() {
        let lines = errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n");
        report_errors("Invalid configuration in airsense.toml", &lines);
    }

    println!("cargo:warning=airsense.toml validated successfully");
}

fn report_errors(title: &str, lines: &str) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, lines
    );
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

fn validate_sampler(config: &toml::Value, errors: &mut Vec<String>) {
    let sampler = match config.get("sampler") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[sampler] must be a table".into());
            return;
        }
        None => return,
    };

    for key in sampler.keys() {
        if !["sample_rate", "temperature_offset", "save_interval", "on_save_failure"]
            .contains(&key.as_str())
        {
            errors.push(format!("[sampler] unknown key '{}'", key));
        }
    }

    match sampler.get("sample_rate") {
        Some(toml::Value::String(rate)) => {
            if !["disabled", "ulp", "lp", "cont", "continuous", "scan"].contains(&rate.as_str()) {
                errors.push(format!(
                    "[sampler] sample_rate must be ulp, lp, cont, scan or disabled, not '{}'",
                    rate
                ));
            }
        }
        Some(_) => errors.push("[sampler] sample_rate must be a string".into()),
        None => {}
    }

    match sampler.get("temperature_offset") {
        Some(toml::Value::Float(v)) if (-20.0..=20.0).contains(v) => {}
        Some(toml::Value::Integer(v)) if (-20..=20).contains(v) => {}
        Some(_) => errors.push("[sampler] temperature_offset must be within -20..20".into()),
        None => {}
    }

    match sampler.get("save_interval") {
        Some(toml::Value::Integer(v)) if *v > 0 && *v <= u32::MAX as i64 => {}
        Some(_) => errors.push("[sampler] save_interval must be a positive integer".into()),
        None => {}
    }

    match sampler.get("on_save_failure") {
        Some(toml::Value::String(policy))
            if ["halt", "retry", "ignore"].contains(&policy.as_str()) => {}
        Some(_) => errors.push("[sampler] on_save_failure must be halt, retry or ignore".into()),
        None => {}
    }
}

fn validate_sensor(config: &toml::Value, errors: &mut Vec<String>) {
    let sensor = match config.get("sensor") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[sensor] must be a table".into());
            return;
        }
        None => return,
    };

    for key in sensor.keys() {
        if !["address", "ambient_temperature"].contains(&key.as_str()) {
            errors.push(format!("[sensor] unknown key '{}'", key));
        }
    }

    match sensor.get("address") {
        Some(toml::Value::Integer(0x76 | 0x77)) | None => {}
        Some(_) => errors.push("[sensor] address must be 0x76 or 0x77".into()),
    }

    match sensor.get("ambient_temperature") {
        Some(toml::Value::Integer(v)) if (-40..=85).contains(v) => {}
        Some(_) => errors.push("[sensor] ambient_temperature must be within -40..85".into()),
        None => {}
    }
}
