// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register codec
//!
//! Pure conversions between engineering units and the raw register bytes of
//! each device family. Nothing in here touches a bus.
//!
//! - [`dac`]: DAC code construction and gain register packing
//! - [`adc`]: ADC code to millivolts
//! - [`temperature`]: IR thermometer register banks and temperature transforms

pub mod adc;
pub mod dac;
pub mod temperature;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Output amplifier gain of a DAC channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gain {
    #[default]
    X1,
    X2,
}

impl Gain {
    /// Multiplier applied to the ideal code
    pub fn multiplier(self) -> f64 {
        match self {
            Gain::X1 => 1.0,
            Gain::X2 => 2.0,
        }
    }
}

impl TryFrom<u8> for Gain {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Gain::X1),
            2 => Ok(Gain::X2),
            other => Err(CodecError::InvalidGain(other)),
        }
    }
}

impl From<Gain> for u8 {
    fn from(gain: Gain) -> Self {
        match gain {
            Gain::X1 => 1,
            Gain::X2 => 2,
        }
    }
}

impl std::fmt::Display for Gain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", u8::from(*self))
    }
}

/// Split a code into its big-endian `(high, low)` register bytes
pub fn split_code(code: u16) -> (u8, u8) {
    (((code >> 8) & 0xFF) as u8, (code & 0xFF) as u8)
}
