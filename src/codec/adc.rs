// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! ADC code decoding (MCP3221, 12-bit)

use crate::error::BusError;

/// Full-scale code of a 12-bit converter
pub const MCP3221_MAX_CODE: u16 = 4095;

/// Number of bytes returned by one conversion read
pub const MCP3221_READ_LENGTH: usize = 2;

/// Assemble the big-endian code from a conversion read `[high, low]`
pub fn mcp3221_code(data: &[u8]) -> Result<u16, BusError> {
    match data {
        [high, low, ..] => Ok(u16::from(*high) << 8 | u16::from(*low)),
        _ => Err(BusError::ShortRead {
            expected: MCP3221_READ_LENGTH,
            actual: data.len(),
        }),
    }
}

/// `code * mvref / 4095`
pub fn code_to_millivolts(code: u16, mvref: f64) -> f64 {
    f64::from(code) * mvref / f64::from(MCP3221_MAX_CODE)
}
