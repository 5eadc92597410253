// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Configuration Management
//!
//! This module implements configuration handling for the I2C analog drivers.
//! It supports loading, validating, and saving configuration from YAML files using
//! JSON Schema validation for robust error checking.
//!
//! ## Configuration Structure
//!
//! - `bus`: which transport to open (`mock` or `native`) and the bus number
//! - `mcp4728` / `mcp47cvb02`: DAC address, reference voltage and initial gain
//! - `mcp3221`: ADC address and reference voltage
//! - `temperature`: IR thermometer address, log slot, retry and polling settings
//!
//! ## Usage
//!
//! ```no_run
//! use rust_analog_i2c::config::Config;
//!
//! // Load config from file, creates a default if not found
//! let config = Config::from_file("config.yaml").unwrap();
//! println!("Thermometer slot: {}", config.temperature.slot);
//! ```

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
    time::Duration,
};

use crate::codec::Gain;
use crate::drivers::mlx90614::RetryPolicy;
use crate::drivers::{mcp3221, mcp4728, mlx90614, DEFAULT_REFERENCE_MV};

/// Embedded JSON schema used to validate configuration files
const CONFIG_SCHEMA: &str = include_str!("../resources/config.schema.json");

/// Highest 7-bit I2C address
const MAX_I2C_ADDRESS: u8 = 0x7F;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bus transport
    #[serde(default)]
    pub bus: BusConfig,

    /// 8-channel DAC
    #[serde(default)]
    pub mcp4728: DacConfig,

    /// 2-channel DAC
    #[serde(default)]
    pub mcp47cvb02: DacConfig,

    /// 12-bit ADC
    #[serde(default)]
    pub mcp3221: AdcConfig,

    /// IR thermometer and its polling monitor
    #[serde(default)]
    pub temperature: TemperatureConfig,
}

/// I2C bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Bus type: "native" for /dev/i2c-N or "mock" for the in-memory bus
    #[serde(rename = "type", default)]
    pub bus_type: BusType,

    /// Bus number N of /dev/i2c-N (only used when type is "native")
    #[serde(default = "default_bus_device")]
    pub device: u8,
}

/// I2C bus type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusType {
    /// Linux I2C character device
    Native,
    /// In-memory bus, no hardware required
    #[default]
    Mock,
}

/// DAC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DacConfig {
    /// 7-bit I2C address
    #[serde(default = "default_dac_address")]
    pub address: u8,

    /// Reference voltage in millivolts
    #[serde(default = "default_reference_mv")]
    pub reference_mv: f64,

    /// Initial gain (1 or 2)
    #[serde(default)]
    pub gain: Gain,
}

/// ADC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdcConfig {
    /// 7-bit I2C address
    #[serde(default = "default_adc_address")]
    pub address: u8,

    /// Reference voltage in millivolts
    #[serde(default = "default_reference_mv")]
    pub reference_mv: f64,
}

/// IR thermometer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureConfig {
    /// Create the thermometer and its polling monitor
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 7-bit I2C address
    #[serde(default = "default_temperature_address")]
    pub address: u8,

    /// Slot label used in log lines
    #[serde(default = "default_slot")]
    pub slot: u32,

    /// Attempts per register read, first one included
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Polling period of the monitor in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Start sampling as soon as the monitor is spawned
    #[serde(default)]
    pub autostart: bool,
}

impl TemperatureConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_bus_device() -> u8 {
    1
}

fn default_dac_address() -> u8 {
    mcp4728::DEFAULT_ADDRESS
}

fn default_adc_address() -> u8 {
    mcp3221::DEFAULT_ADDRESS
}

fn default_temperature_address() -> u8 {
    mlx90614::DEFAULT_ADDRESS
}

fn default_reference_mv() -> f64 {
    DEFAULT_REFERENCE_MV
}

fn default_slot() -> u32 {
    1
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            bus_type: BusType::default(),
            device: default_bus_device(),
        }
    }
}

impl Default for DacConfig {
    fn default() -> Self {
        Self {
            address: default_dac_address(),
            reference_mv: default_reference_mv(),
            gain: Gain::X1,
        }
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            address: default_adc_address(),
            reference_mv: default_reference_mv(),
        }
    }
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_temperature_address(),
            slot: default_slot(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            autostart: false,
        }
    }
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default values. A file failing
    /// validation leaves a `.sample.yaml` with defaults next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|e| anyhow::anyhow!("Invalid configuration schema: {}", e))?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = Self::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line overrides
    pub fn apply_args(&mut self, bus_type: Option<BusType>, bus_device: Option<u8>) {
        if let Some(bus_type) = bus_type {
            self.bus.bus_type = bus_type;
        }
        if let Some(device) = bus_device {
            self.bus.device = device;
        }
    }

    /// Rules the schema cannot express
    ///
    /// - Reference voltages must be finite and strictly positive
    /// - Addresses must fit in 7 bits
    /// - At least one read attempt and a non-zero polling period
    fn validate_specific_rules(config: &Config) -> Result<()> {
        debug!("Performing additional validation checks");

        for (name, reference_mv) in [
            ("mcp4728", config.mcp4728.reference_mv),
            ("mcp47cvb02", config.mcp47cvb02.reference_mv),
            ("mcp3221", config.mcp3221.reference_mv),
        ] {
            if !(reference_mv.is_finite() && reference_mv > 0.0) {
                anyhow::bail!("Invalid {} reference voltage: {} mV", name, reference_mv);
            }
        }

        for (name, address) in [
            ("mcp4728", config.mcp4728.address),
            ("mcp47cvb02", config.mcp47cvb02.address),
            ("mcp3221", config.mcp3221.address),
            ("temperature", config.temperature.address),
        ] {
            if address > MAX_I2C_ADDRESS {
                anyhow::bail!("Invalid {} I2C address: 0x{:02X}", name, address);
            }
        }

        if config.temperature.retry_attempts == 0 {
            anyhow::bail!("temperature.retry_attempts must be at least 1");
        }
        if config.temperature.poll_interval_ms == 0 {
            anyhow::bail!("temperature.poll_interval_ms must be greater than 0");
        }
        Ok(())
    }
}

/// Output the embedded JSON schema to the console.
///
/// Called for `--show-config-schema`.
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bus.bus_type, BusType::Mock);
        assert_eq!(config.mcp4728.address, 0x60);
        assert_eq!(config.mcp3221.address, 0x4E);
        assert_eq!(config.mcp3221.reference_mv, 5000.0);
        assert_eq!(config.temperature.address, 0x5A);
        assert_eq!(config.temperature.retry_policy(), RetryPolicy::default());
        assert_eq!(config.temperature.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_specific_rules() {
        let mut config = Config::default();
        assert!(Config::validate_specific_rules(&config).is_ok());

        config.mcp47cvb02.reference_mv = 0.0;
        assert!(Config::validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.temperature.address = 0x80;
        assert!(Config::validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.temperature.retry_attempts = 0;
        assert!(Config::validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(Some(BusType::Native), Some(3));
        assert_eq!(config.bus.bus_type, BusType::Native);
        assert_eq!(config.bus.device, 3);

        config.apply_args(None, None);
        assert_eq!(config.bus.device, 3);
    }

    #[test]
    fn test_embedded_schema_is_valid_json() {
        assert!(serde_json::from_str::<serde_json::Value>(CONFIG_SCHEMA).is_ok());
    }
}
