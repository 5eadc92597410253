// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device drivers
//!
//! One driver per device family, each composing the register codec with a
//! [`BusTransport`](crate::bus::BusTransport):
//! - MCP4728: 8-channel 12-bit DAC with per-channel gain
//! - MCP47CVB02: 2-channel 8-bit DAC with a shared gain register
//! - MCP3221: 12-bit ADC
//! - MLX90614: IR thermometer with retried register reads
//!
//! The two DACs expose the common [`VoltageSource`] capability while keeping
//! their own register layouts.

pub mod mcp3221;
pub mod mcp4728;
pub mod mcp47cvb02;
pub mod mlx90614;

pub use mcp3221::Mcp3221;
pub use mcp4728::Mcp4728;
pub use mcp47cvb02::Mcp47cvb02;
pub use mlx90614::Mlx90614;

use crate::codec::Gain;
use crate::error::DeviceError;

/// Default DAC / ADC reference voltage in millivolts
pub const DEFAULT_REFERENCE_MV: f64 = 5000.0;

/// A configurable DC voltage source
pub trait VoltageSource {
    /// Device name used in error messages and logs
    fn name(&self) -> &'static str;

    /// Number of output channels
    fn channel_count(&self) -> u8;

    /// Reference voltage in millivolts
    fn reference_voltage_mv(&self) -> f64;

    /// Apply `gain` to every channel
    fn set_all_gain(&mut self, gain: Gain) -> Result<(), DeviceError>;

    /// Drive `channel` to `millivolts`
    fn output_volt_dc(&mut self, channel: u8, millivolts: f64) -> Result<(), DeviceError>;

    /// Send the device reset sequence
    fn output_reset(&mut self) -> Result<(), DeviceError>;
}
