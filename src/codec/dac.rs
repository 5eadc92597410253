// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! DAC code construction and gain register packing
//!
//! The two DAC families encode gain very differently and the layouts are kept
//! apart on purpose:
//! - MCP4728: gain lives in the low nibble of a single command byte, one bit
//!   per channel, channel 0 on bit 3
//! - MCP47CVB02: gain is a 16-bit memory-mapped register written through the
//!   `(command << 1) | (address << 3)` framing, and "gain 2 on all channels"
//!   sets the whole low byte

use crate::codec::Gain;
use crate::error::CodecError;

/// MCP4728 full-scale divisor (12-bit)
pub const MCP4728_FULL_SCALE: f64 = 4096.0;
/// Largest MCP4728 code
pub const MCP4728_MAX_CODE: u16 = 4095;
pub const MCP4728_CHANNEL_COUNT: u8 = 8;
/// Multi-write command per channel index
pub const MCP4728_CHANNEL_COMMANDS: [u8; MCP4728_CHANNEL_COUNT as usize] =
    [0x40, 0x42, 0x44, 0x46, 0x48, 0x4A, 0x4C, 0x4E];
/// Gain select opcode, gain bits in the low nibble
pub const MCP4728_WRITE_GAIN: u8 = 0xC0;
/// Highest channel addressable by the single-channel gain command
pub const MCP4728_SINGLE_GAIN_MAX_CHANNEL: u8 = 3;

/// MCP47CVB02 full-scale multiplier (8-bit)
pub const MCP47CVB02_FULL_SCALE: f64 = 255.0;
pub const MCP47CVB02_MAX_CODE: u16 = 255;
pub const MCP47CVB02_CHANNEL_COUNT: u8 = 2;
pub const MCP47CVB02_WRITE_REG: u8 = 0x00;
pub const MCP47CVB02_GAIN_SETUP_REGISTER: u8 = 0x0A;

const REG_GAIN_1: u8 = 0x00;
const REG_GAIN_2: u8 = 0x01;

fn gain_bit(gain: Gain) -> u8 {
    match gain {
        Gain::X1 => REG_GAIN_1,
        Gain::X2 => REG_GAIN_2,
    }
}

/// Check a reference voltage is usable as a divisor
pub fn check_reference(mvref: f64) -> Result<(), CodecError> {
    if mvref.is_finite() && mvref > 0.0 {
        Ok(())
    } else {
        Err(CodecError::InvalidReference(mvref))
    }
}

fn check_voltage(millivolts: f64, mvref: f64) -> Result<(), CodecError> {
    if millivolts >= 0.0 && millivolts <= mvref {
        Ok(())
    } else {
        Err(CodecError::VoltageOutOfRange {
            millivolts,
            max: mvref,
        })
    }
}

fn check_channel(channel: u8, count: u8) -> Result<(), CodecError> {
    if channel < count {
        Ok(())
    } else {
        Err(CodecError::ChannelOutOfRange {
            channel,
            max: count - 1,
        })
    }
}

/// `floor(volt * scale / mvref * gain)`, evaluated in that order
fn quantize(millivolts: f64, mvref: f64, scale: f64, gain: Gain) -> Result<u32, CodecError> {
    check_reference(mvref)?;
    check_voltage(millivolts, mvref)?;
    Ok((millivolts * scale / mvref * gain.multiplier()).floor() as u32)
}

/// MCP4728 code for `millivolts`
///
/// A code of exactly 4096 (the reference voltage at gain 1) is clamped to
/// 4095. Anything larger cannot be represented and is rejected.
pub fn mcp4728_code(millivolts: f64, mvref: f64, gain: Gain) -> Result<u16, CodecError> {
    let code = quantize(millivolts, mvref, MCP4728_FULL_SCALE, gain)?;
    let max = u32::from(MCP4728_MAX_CODE);
    match code {
        c if c == max + 1 => Ok(MCP4728_MAX_CODE),
        c if c > max => Err(CodecError::CodeOverflow { code: c, max }),
        c => Ok(c as u16),
    }
}

/// Multi-write command byte for an MCP4728 channel
pub fn mcp4728_channel_command(channel: u8) -> Result<u8, CodecError> {
    check_channel(channel, MCP4728_CHANNEL_COUNT)?;
    Ok(MCP4728_CHANNEL_COMMANDS[channel as usize])
}

/// Gain command applying `gain` to every MCP4728 channel
pub fn mcp4728_all_gain_command(gain: Gain) -> u8 {
    let register = match gain {
        Gain::X1 => REG_GAIN_1,
        Gain::X2 => REG_GAIN_2 | 0xF,
    };
    MCP4728_WRITE_GAIN | register
}

/// Gain command for a single MCP4728 channel
///
/// The gain bit is placed at `3 - channel`, so only channels 0 to 3 have a
/// position in the command byte.
pub fn mcp4728_single_gain_command(channel: u8, gain: Gain) -> Result<u8, CodecError> {
    if channel > MCP4728_SINGLE_GAIN_MAX_CHANNEL {
        return Err(CodecError::ChannelOutOfRange {
            channel,
            max: MCP4728_SINGLE_GAIN_MAX_CHANNEL,
        });
    }
    Ok(MCP4728_WRITE_GAIN | (gain_bit(gain) << (3 - channel)))
}

/// Gains of channels 0 to 3 as programmed by an MCP4728 gain command byte
///
/// The command carries the gain bit of every channel at once, bit `3 - channel`.
pub fn mcp4728_gains_from_command(command: u8) -> [Gain; 4] {
    std::array::from_fn(|channel| {
        if command & (1 << (3 - channel)) != 0 {
            Gain::X2
        } else {
            Gain::X1
        }
    })
}

/// MCP47CVB02 code for `millivolts`
pub fn mcp47cvb02_code(millivolts: f64, mvref: f64, gain: Gain) -> Result<u16, CodecError> {
    let code = quantize(millivolts, mvref, MCP47CVB02_FULL_SCALE, gain)?;
    let max = u32::from(MCP47CVB02_MAX_CODE);
    if code > max {
        return Err(CodecError::CodeOverflow { code, max });
    }
    Ok(code as u16)
}

/// Validate an MCP47CVB02 channel, which doubles as its register address
pub fn mcp47cvb02_channel_address(channel: u8) -> Result<u8, CodecError> {
    check_channel(channel, MCP47CVB02_CHANNEL_COUNT)?;
    Ok(channel)
}

/// First byte of an MCP47CVB02 register transfer
pub fn mcp47cvb02_command_byte(command: u8, address: u8) -> u8 {
    (command << 1) | (address << 3)
}

/// Full `[command_byte, high, low]` register write frame
pub fn mcp47cvb02_frame(command: u8, address: u8, value: u16) -> [u8; 3] {
    let (high, low) = super::split_code(value);
    [mcp47cvb02_command_byte(command, address), high, low]
}

/// Gain register value for "all channels"
pub fn mcp47cvb02_all_gain_register(gain: Gain) -> u16 {
    match gain {
        Gain::X1 => u16::from(REG_GAIN_1),
        Gain::X2 => u16::from(REG_GAIN_2 | 0xFF),
    }
}

/// Gain register value for the shared gain path
pub fn mcp47cvb02_single_gain_register(gain: Gain) -> u16 {
    u16::from(gain_bit(gain))
}
