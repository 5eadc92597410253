// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! MCP4728 12-bit DAC driver
//!
//! Each channel keeps its own gain so that `set_single_gain` only affects the
//! code computed for that channel. Gain commands are one byte long, channel
//! writes are `[command, high, low]`.

use log::debug;

use crate::bus::BusTransport;
use crate::codec::dac::{
    check_reference, mcp4728_all_gain_command, mcp4728_channel_command, mcp4728_code,
    mcp4728_gains_from_command, mcp4728_single_gain_command, MCP4728_CHANNEL_COUNT,
};
use crate::codec::{split_code, Gain};
use crate::drivers::VoltageSource;
use crate::error::DeviceError;

const DEVICE: &str = "MCP4728";

pub const DEFAULT_ADDRESS: u8 = 0x60;

/// MCP4728 driver
pub struct Mcp4728<B> {
    bus: B,
    address: u8,
    mvref: f64,
    gains: [Gain; MCP4728_CHANNEL_COUNT as usize],
}

impl<B: BusTransport> Mcp4728<B> {
    /// Create the driver and program `gain` on every channel
    pub fn new(bus: B, address: u8, mvref: f64, gain: Gain) -> Result<Self, DeviceError> {
        check_reference(mvref).map_err(DeviceError::invalid(DEVICE))?;
        let mut dac = Self {
            bus,
            address,
            mvref,
            gains: [gain; MCP4728_CHANNEL_COUNT as usize],
        };
        dac.set_all_gain(gain)?;
        Ok(dac)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gain currently applied to `channel`
    pub fn gain(&self, channel: u8) -> Option<Gain> {
        self.gains.get(channel as usize).copied()
    }

    /// Set the gain of one channel (0 to 3)
    ///
    /// The command byte rewrites the gain bits of channels 0 to 3 together, so
    /// every channel other than `channel` in that range falls back to x1.
    pub fn set_single_gain(&mut self, channel: u8, gain: Gain) -> Result<(), DeviceError> {
        let command =
            mcp4728_single_gain_command(channel, gain).map_err(DeviceError::invalid(DEVICE))?;
        self.write(&[command])?;
        let programmed = mcp4728_gains_from_command(command);
        self.gains[..programmed.len()].copy_from_slice(&programmed);
        Ok(())
    }

    /// Give back the transport
    pub fn release(self) -> B {
        self.bus
    }

    fn write(&mut self, data: &[u8]) -> Result<(), DeviceError> {
        debug!("{} 0x{:02X} <- {:02X?}", DEVICE, self.address, data);
        self.bus
            .write(self.address, data)
            .map_err(DeviceError::bus(DEVICE))
    }
}

impl<B: BusTransport> VoltageSource for Mcp4728<B> {
    fn name(&self) -> &'static str {
        DEVICE
    }

    fn channel_count(&self) -> u8 {
        MCP4728_CHANNEL_COUNT
    }

    fn reference_voltage_mv(&self) -> f64 {
        self.mvref
    }

    fn set_all_gain(&mut self, gain: Gain) -> Result<(), DeviceError> {
        self.write(&[mcp4728_all_gain_command(gain)])?;
        self.gains = [gain; MCP4728_CHANNEL_COUNT as usize];
        Ok(())
    }

    fn output_volt_dc(&mut self, channel: u8, millivolts: f64) -> Result<(), DeviceError> {
        let command = mcp4728_channel_command(channel).map_err(DeviceError::invalid(DEVICE))?;
        let gain = self.gains[channel as usize];
        let code =
            mcp4728_code(millivolts, self.mvref, gain).map_err(DeviceError::invalid(DEVICE))?;
        let (high, low) = split_code(code);
        self.write(&[command, high, low])
    }

    fn output_reset(&mut self) -> Result<(), DeviceError> {
        self.write(&[0x00, 0x00])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockBus;
    use crate::error::CodecError;

    fn dac() -> Mcp4728<MockBus> {
        let mut dac = Mcp4728::new(MockBus::new(), DEFAULT_ADDRESS, 5000.0, Gain::X1).unwrap();
        dac.bus.clear_transactions();
        dac
    }

    #[test]
    fn test_new_programs_initial_gain() {
        let dac = Mcp4728::new(MockBus::new(), 0x61, 5000.0, Gain::X2).unwrap();
        assert_eq!(dac.gain(7), Some(Gain::X2));
        let bus = dac.release();
        assert_eq!(bus.written(), vec![vec![0xCF]]);
        assert_eq!(
            bus.transactions()[0],
            crate::bus::BusTransaction::Write {
                address: 0x61,
                data: vec![0xCF]
            }
        );
    }

    #[test]
    fn test_new_rejects_bad_reference() {
        let err = Mcp4728::new(MockBus::new(), DEFAULT_ADDRESS, 0.0, Gain::X1)
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "[MCP4728]: reference voltage must be positive, got 0 mV.");
    }

    #[test]
    fn test_set_all_gain() {
        let mut dac = dac();
        dac.set_all_gain(Gain::X2).unwrap();
        dac.set_all_gain(Gain::X1).unwrap();
        assert_eq!(dac.release().written(), vec![vec![0xCF], vec![0xC0]]);
    }

    #[test]
    fn test_set_single_gain() {
        let mut dac = dac();
        dac.set_single_gain(0, Gain::X2).unwrap();
        assert_eq!(dac.gain(0), Some(Gain::X2));

        // The second command clears the gain bit of channel 0
        dac.set_single_gain(3, Gain::X2).unwrap();
        assert_eq!(dac.gain(0), Some(Gain::X1));
        assert_eq!(dac.gain(1), Some(Gain::X1));
        assert_eq!(dac.gain(3), Some(Gain::X2));

        let err = dac.set_single_gain(5, Gain::X2).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::InvalidArgument {
                source: CodecError::ChannelOutOfRange { channel: 5, max: 3 },
                ..
            }
        ));
        assert_eq!(dac.release().written(), vec![vec![0xC8], vec![0xC1]]);
    }

    #[test]
    fn test_output_volt_dc() {
        let mut dac = dac();
        dac.output_volt_dc(0, 1000.0).unwrap();
        dac.output_volt_dc(7, 5000.0).unwrap();
        assert_eq!(
            dac.release().written(),
            vec![vec![0x40, 0x03, 0x33], vec![0x4E, 0x0F, 0xFF]]
        );
    }

    #[test]
    fn test_output_volt_dc_uses_channel_gain() {
        let mut dac = dac();
        dac.set_single_gain(1, Gain::X2).unwrap();
        dac.output_volt_dc(1, 1000.0).unwrap();
        dac.output_volt_dc(2, 1000.0).unwrap();
        let written = dac.release().written();
        // 1638 = 0x666, 819 = 0x333
        assert_eq!(written[1], vec![0x42, 0x06, 0x66]);
        assert_eq!(written[2], vec![0x44, 0x03, 0x33]);
    }

    #[test]
    fn test_single_gain_resets_other_channels() {
        let mut dac = Mcp4728::new(MockBus::new(), DEFAULT_ADDRESS, 5000.0, Gain::X2).unwrap();
        dac.set_single_gain(1, Gain::X1).unwrap();
        assert_eq!(dac.gain(0), Some(Gain::X1));
        assert_eq!(dac.gain(4), Some(Gain::X2));

        dac.output_volt_dc(0, 1000.0).unwrap();
        let written = dac.release().written();
        assert_eq!(written[1], vec![0xC0]);
        // 819 = 0x333 at x1
        assert_eq!(written[2], vec![0x40, 0x03, 0x33]);
    }

    #[test]
    fn test_output_volt_dc_preconditions_do_not_touch_bus() {
        let mut dac = dac();
        assert!(dac.output_volt_dc(8, 100.0).is_err());
        assert!(dac.output_volt_dc(0, -5.0).is_err());
        assert!(dac.output_volt_dc(0, 5001.0).is_err());
        assert!(dac.release().transactions().is_empty());
    }

    #[test]
    fn test_output_reset() {
        let mut dac = dac();
        dac.output_reset().unwrap();
        assert_eq!(dac.release().written(), vec![vec![0x00, 0x00]]);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut dac = dac();
        dac.bus.fail_next(1);
        let err = dac.output_reset().unwrap_err();
        assert!(matches!(err, DeviceError::Bus { device: "MCP4728", .. }));
        // No retry
        assert_eq!(dac.release().transactions().len(), 1);
    }
}
