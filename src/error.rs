// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error types shared by the bus layer, the register codec and the drivers
//!
//! Errors are layered the same way the drivers are:
//! - [`BusError`]: a transport transaction failed
//! - [`CodecError`]: an argument is outside what the device register can encode
//! - [`DeviceError`]: one of the above, prefixed with the device name

use thiserror::Error;

/// Failure of a single bus transaction
#[derive(Debug, Error)]
pub enum BusError {
    /// The addressed device did not acknowledge
    #[error("no acknowledge from device 0x{0:02X}")]
    Nack(u8),

    /// Another master won arbitration
    #[error("bus arbitration lost")]
    ArbitrationLost,

    /// Generic bus fault reported by the back-end
    #[error("bus fault: {0}")]
    Fault(String),

    /// The device returned fewer bytes than requested
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// A thread panicked while holding the bus lock
    #[error("bus lock poisoned")]
    Poisoned,

    /// Operating system level I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Argument that cannot be encoded into a device register
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("gain must be 1 or 2, got {0}")]
    InvalidGain(u8),

    #[error("channel {channel} out of range (0..={max})")]
    ChannelOutOfRange { channel: u8, max: u8 },

    #[error("voltage {millivolts} mV out of range (0..={max} mV)")]
    VoltageOutOfRange { millivolts: f64, max: f64 },

    #[error("reference voltage must be positive, got {0} mV")]
    InvalidReference(f64),

    #[error("code {code} exceeds the {max} full scale of the converter")]
    CodeOverflow { code: u32, max: u32 },
}

/// Error reported by a device driver, formatted as `[DEVICE]: reason.`
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("[{device}]: {source}.")]
    Bus {
        device: &'static str,
        #[source]
        source: BusError,
    },

    #[error("[{device}]: {source}.")]
    InvalidArgument {
        device: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("[{device}]: read failed after {attempts} attempts: {last}.")]
    RetriesExhausted {
        device: &'static str,
        attempts: u32,
        #[source]
        last: BusError,
    },
}

impl DeviceError {
    pub(crate) fn bus(device: &'static str) -> impl FnOnce(BusError) -> Self {
        move |source| DeviceError::Bus { device, source }
    }

    pub(crate) fn invalid(device: &'static str) -> impl FnOnce(CodecError) -> Self {
        move |source| DeviceError::InvalidArgument { device, source }
    }

    /// Name of the device that raised the error
    pub fn device(&self) -> &'static str {
        match self {
            DeviceError::Bus { device, .. }
            | DeviceError::InvalidArgument { device, .. }
            | DeviceError::RetriesExhausted { device, .. } => device,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_message_is_prefixed() {
        let err = DeviceError::InvalidArgument {
            device: "MCP4728",
            source: CodecError::InvalidGain(3),
        };
        assert_eq!(err.to_string(), "[MCP4728]: gain must be 1 or 2, got 3.");
        assert_eq!(err.device(), "MCP4728");
    }

    #[test]
    fn test_bus_error_wrapping() {
        let err = DeviceError::bus("MCP3221")(BusError::Nack(0x4E));
        assert_eq!(err.to_string(), "[MCP3221]: no acknowledge from device 0x4E.");
    }
}
