//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; missing values fall back to
//! the `default_*` functions below.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::actuator::serial::SUPPORTED_BAUD_RATES;
use crate::error::{Result, RoverPadError};
use crate::translator::deadzone::DEFAULT_DEADZONE_THRESHOLD;
use crate::translator::tracker::MAX_SOURCES;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub translator: TranslatorSettings,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Translator behaviour at start-up (both toggles can be flipped at runtime)
#[derive(Debug, Deserialize, Clone)]
pub struct TranslatorSettings {
    #[serde(default = "default_deadzone_enabled")]
    pub deadzone_enabled: bool,

    #[serde(default = "default_deadzone_threshold")]
    pub deadzone_threshold: i32,

    #[serde(default = "default_heading_assist_enabled")]
    pub heading_assist_enabled: bool,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Explicit evdev paths; empty means auto-detect
    #[serde(default)]
    pub device_paths: Vec<String>,

    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Raw value of a fully pulled trigger
    #[serde(default = "default_trigger_max")]
    pub trigger_max: i32,
}

/// Which backend receives motion commands
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    /// Dry run, commands are only logged
    #[default]
    Log,
    /// ARCOS controller on a serial port
    Serial,
}

/// Actuator configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ActuatorConfig {
    #[serde(default)]
    pub kind: ActuatorKind,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Tried in order when `port` cannot be opened
    #[serde(default)]
    pub fallback_ports: Vec<String>,
}

impl SerialConfig {
    /// `port` followed by the fallbacks, without duplicates.
    #[must_use]
    pub fn candidate_ports(&self) -> Vec<String> {
        let mut ports = vec![self.port.clone()];
        for port in &self.fallback_ports {
            if !ports.contains(port) {
                ports.push(port.clone());
            }
        }
        ports
    }
}

/// Motion journal configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub file_dir: Option<String>,
}

// Default value functions
fn default_deadzone_enabled() -> bool { true }
fn default_deadzone_threshold() -> i32 { DEFAULT_DEADZONE_THRESHOLD }
fn default_heading_assist_enabled() -> bool { false }
fn default_tick_interval_ms() -> u64 { 10 }

fn default_max_sources() -> usize { MAX_SOURCES }
fn default_trigger_max() -> i32 { 255 }

fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            deadzone_enabled: default_deadzone_enabled(),
            deadzone_threshold: default_deadzone_threshold(),
            heading_assist_enabled: default_heading_assist_enabled(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_paths: Vec::new(),
            max_sources: default_max_sources(),
            trigger_max: default_trigger_max(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            fallback_ports: Vec::new(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_dir: None,
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> RoverPadError {
    RoverPadError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rover_pad::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Examples
    ///
    /// ```
    /// use rover_pad::config::{ActuatorKind, Config};
    ///
    /// let config = Config::parse("[actuator]\nkind = \"serial\"\n")?;
    /// assert_eq!(config.actuator.kind, ActuatorKind::Serial);
    /// assert!(config.translator.deadzone_enabled);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if !(0..=i32::from(i16::MAX)).contains(&self.translator.deadzone_threshold) {
            return Err(invalid("deadzone_threshold must be between 0 and 32767"));
        }

        if self.translator.tick_interval_ms == 0 || self.translator.tick_interval_ms > 1000 {
            return Err(invalid("tick_interval_ms must be between 1 and 1000"));
        }

        if self.controller.max_sources == 0 || self.controller.max_sources > MAX_SOURCES {
            return Err(invalid(format!("max_sources must be between 1 and {}", MAX_SOURCES)));
        }

        if self.controller.device_paths.len() > self.controller.max_sources {
            return Err(invalid("more device_paths than max_sources"));
        }

        if self.controller.device_paths.iter().any(|p| p.is_empty()) {
            return Err(invalid("device_paths entries cannot be empty"));
        }

        if self.controller.trigger_max <= 0 || self.controller.trigger_max > 65535 {
            return Err(invalid("trigger_max must be between 1 and 65535"));
        }

        if self.actuator.kind == ActuatorKind::Serial && self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if self.serial.fallback_ports.iter().any(|p| p.is_empty()) {
            return Err(invalid("fallback_ports entries cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        Ok(())
    }
}
