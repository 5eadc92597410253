// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust analog I2C library
//!
//! Drivers for analog peripherals on an I2C bus: the MCP4728 and MCP47CVB02
//! DACs, the MCP3221 ADC and the MLX90614 infrared thermometer, with a
//! polling monitor for the thermometer.
//!
//! ```no_run
//! use rust_analog_i2c::bus::MockBus;
//! use rust_analog_i2c::codec::Gain;
//! use rust_analog_i2c::drivers::{Mcp4728, VoltageSource};
//!
//! let mut dac = Mcp4728::new(MockBus::new(), 0x60, 5000.0, Gain::X1)?;
//! dac.output_volt_dc(0, 1250.0)?;
//! # Ok::<(), rust_analog_i2c::error::DeviceError>(())
//! ```

pub mod bus;
pub mod codec;
pub mod compat;
pub mod config;
pub mod daemon;
pub mod drivers;
pub mod error;
pub mod logging;

pub use error::{BusError, CodecError, DeviceError};
