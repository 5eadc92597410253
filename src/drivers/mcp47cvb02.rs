// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! MCP47CVB02 8-bit dual DAC driver
//!
//! All transfers are memory-mapped register writes framed as
//! `[(command << 1) | (address << 3), high, low]`. The DAC channels are the
//! volatile wiper registers 0 and 1; gain lives in register `0x0A` and is
//! shared by both channels.

use log::debug;

use crate::bus::BusTransport;
use crate::codec::dac::{
    check_reference, mcp47cvb02_all_gain_register, mcp47cvb02_channel_address, mcp47cvb02_code,
    mcp47cvb02_frame, mcp47cvb02_single_gain_register, MCP47CVB02_CHANNEL_COUNT,
    MCP47CVB02_GAIN_SETUP_REGISTER, MCP47CVB02_WRITE_REG,
};
use crate::codec::Gain;
use crate::drivers::VoltageSource;
use crate::error::DeviceError;

const DEVICE: &str = "MCP47CVB02";

pub const DEFAULT_ADDRESS: u8 = 0x60;

/// MCP47CVB02 driver
pub struct Mcp47cvb02<B> {
    bus: B,
    address: u8,
    mvref: f64,
    gain: Gain,
}

impl<B: BusTransport> Mcp47cvb02<B> {
    /// Create the driver and program `gain` on the shared gain path
    pub fn new(bus: B, address: u8, mvref: f64, gain: Gain) -> Result<Self, DeviceError> {
        check_reference(mvref).map_err(DeviceError::invalid(DEVICE))?;
        let mut dac = Self {
            bus,
            address,
            mvref,
            gain,
        };
        dac.set_all_gain(gain)?;
        Ok(dac)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Set the gain of the single shared gain path
    pub fn set_single_gain(&mut self, gain: Gain) -> Result<(), DeviceError> {
        self.write_register(
            MCP47CVB02_WRITE_REG,
            MCP47CVB02_GAIN_SETUP_REGISTER,
            mcp47cvb02_single_gain_register(gain),
        )?;
        self.gain = gain;
        Ok(())
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn write_register(&mut self, command: u8, register: u8, value: u16) -> Result<(), DeviceError> {
        self.write(&mcp47cvb02_frame(command, register, value))
    }

    fn write(&mut self, data: &[u8]) -> Result<(), DeviceError> {
        debug!("{} 0x{:02X} <- {:02X?}", DEVICE, self.address, data);
        self.bus
            .write(self.address, data)
            .map_err(DeviceError::bus(DEVICE))
    }
}

impl<B: BusTransport> VoltageSource for Mcp47cvb02<B> {
    fn name(&self) -> &'static str {
        DEVICE
    }

    fn channel_count(&self) -> u8 {
        MCP47CVB02_CHANNEL_COUNT
    }

    fn reference_voltage_mv(&self) -> f64 {
        self.mvref
    }

    fn set_all_gain(&mut self, gain: Gain) -> Result<(), DeviceError> {
        self.write_register(
            MCP47CVB02_WRITE_REG,
            MCP47CVB02_GAIN_SETUP_REGISTER,
            mcp47cvb02_all_gain_register(gain),
        )?;
        self.gain = gain;
        Ok(())
    }

    fn output_volt_dc(&mut self, channel: u8, millivolts: f64) -> Result<(), DeviceError> {
        let register = mcp47cvb02_channel_address(channel).map_err(DeviceError::invalid(DEVICE))?;
        let code = mcp47cvb02_code(millivolts, self.mvref, self.gain)
            .map_err(DeviceError::invalid(DEVICE))?;
        self.write_register(MCP47CVB02_WRITE_REG, register, code)
    }

    fn output_reset(&mut self) -> Result<(), DeviceError> {
        self.write(&[0x00, 0x00])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockBus;

    fn dac() -> Mcp47cvb02<MockBus> {
        let mut dac = Mcp47cvb02::new(MockBus::new(), DEFAULT_ADDRESS, 5000.0, Gain::X1).unwrap();
        dac.bus.clear_transactions();
        dac
    }

    #[test]
    fn test_new_writes_gain_register() {
        let dac = Mcp47cvb02::new(MockBus::new(), DEFAULT_ADDRESS, 5000.0, Gain::X1).unwrap();
        assert_eq!(dac.release().written(), vec![vec![0x50, 0x00, 0x00]]);
    }

    #[test]
    fn test_set_all_gain_full_byte() {
        let mut dac = dac();
        dac.set_all_gain(Gain::X2).unwrap();
        assert_eq!(dac.gain(), Gain::X2);
        assert_eq!(dac.release().written(), vec![vec![0x50, 0x00, 0xFF]]);
    }

    #[test]
    fn test_set_single_gain_single_bit() {
        let mut dac = dac();
        dac.set_single_gain(Gain::X2).unwrap();
        dac.set_single_gain(Gain::X1).unwrap();
        assert_eq!(
            dac.release().written(),
            vec![vec![0x50, 0x00, 0x01], vec![0x50, 0x00, 0x00]]
        );
    }

    #[test]
    fn test_output_volt_dc() {
        let mut dac = dac();
        dac.output_volt_dc(0, 1000.0).unwrap();
        dac.output_volt_dc(1, 5000.0).unwrap();
        assert_eq!(
            dac.release().written(),
            vec![vec![0x00, 0x00, 51], vec![0x08, 0x00, 0xFF]]
        );
    }

    #[test]
    fn test_output_volt_dc_rejects_invalid_arguments() {
        let mut dac = dac();
        assert!(dac.output_volt_dc(2, 1000.0).is_err());
        assert!(dac.output_volt_dc(0, 6000.0).is_err());

        dac.set_all_gain(Gain::X2).unwrap();
        assert!(dac.output_volt_dc(0, 4000.0).is_err());
        assert_eq!(dac.release().transactions().len(), 1);
    }

    #[test]
    fn test_output_reset() {
        let mut dac = dac();
        dac.output_reset().unwrap();
        assert_eq!(dac.release().written(), vec![vec![0x00, 0x00]]);
    }
}
