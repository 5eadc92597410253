// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! IR thermometer (MLX90614) register layout and temperature transforms
//!
//! Temperatures are read as a 16-bit word with a resolution of 0.02 K. The
//! transfer is `[low, high, pec]`; the PEC byte is received but not checked.

use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// Register addresses
pub mod register {
    // RAM
    pub const RAWIR1: u8 = 0x04;
    pub const RAWIR2: u8 = 0x05;
    pub const TA: u8 = 0x06;
    pub const TOBJ1: u8 = 0x07;
    pub const TOBJ2: u8 = 0x08;

    // EEPROM
    pub const TOMAX: u8 = 0x20;
    pub const TOMIN: u8 = 0x21;
    pub const PWMCTRL: u8 = 0x22;
    pub const TARANGE: u8 = 0x23;
    pub const EMISS: u8 = 0x24;
    pub const CONFIG: u8 = 0x25;
    pub const ADDR: u8 = 0x0E;
    pub const ID1: u8 = 0x3C;
    pub const ID2: u8 = 0x3D;
    pub const ID3: u8 = 0x3E;
    pub const ID4: u8 = 0x3F;
}

/// Kelvin per LSB of a temperature register
pub const RAW_RESOLUTION_K: f64 = 0.02;
pub const KELVIN_OFFSET: f64 = 273.15;
/// Bytes per register read: low, high, PEC
pub const READ_LENGTH: usize = 3;

/// Register address space of the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterBank {
    /// Volatile measurement registers
    Ram,
    /// Non-volatile configuration registers
    Eeprom,
}

/// Command byte selecting `register` in `bank`
pub fn bank_address(register: u8, bank: RegisterBank) -> u8 {
    match bank {
        RegisterBank::Ram => register & 0x1F,
        RegisterBank::Eeprom => (register & 0x1F) | 0x20,
    }
}

/// Rebuild the 16-bit word from a `[low, high, pec]` transfer
pub fn raw_word(data: &[u8]) -> Result<u16, BusError> {
    match data {
        [low, high, _pec, ..] => Ok(u16::from(*high) << 8 | u16::from(*low)),
        _ => Err(BusError::ShortRead {
            expected: READ_LENGTH,
            actual: data.len(),
        }),
    }
}

/// `raw * 0.02 - 273.15`
pub fn raw_to_celsius(raw: u16) -> f64 {
    f64::from(raw) * RAW_RESOLUTION_K - KELVIN_OFFSET
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Empirical self-heating correction applied to object readings
///
/// | reading       | offset  |
/// |---------------|---------|
/// | > 82 °C       | −6.0    |
/// | > 60 °C       | −4.5    |
/// | > 40 °C       | −2.0    |
/// | otherwise     | none    |
pub fn self_heating_correction(celsius: f64) -> f64 {
    if celsius > 82.0 {
        celsius - 6.0
    } else if celsius > 60.0 {
        celsius - 4.5
    } else if celsius > 40.0 {
        celsius - 2.0
    } else {
        celsius
    }
}
