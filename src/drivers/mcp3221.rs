// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! MCP3221 12-bit ADC driver

use log::debug;

use crate::bus::BusTransport;
use crate::codec::adc::{code_to_millivolts, mcp3221_code, MCP3221_READ_LENGTH};
use crate::codec::dac::check_reference;
use crate::drivers::DEFAULT_REFERENCE_MV;
use crate::error::DeviceError;

const DEVICE: &str = "MCP3221";

pub const DEFAULT_ADDRESS: u8 = 0x4E;

/// MCP3221 driver
pub struct Mcp3221<B> {
    bus: B,
    address: u8,
    mvref: f64,
}

impl<B: BusTransport> Mcp3221<B> {
    pub fn new(bus: B, address: u8, mvref: f64) -> Result<Self, DeviceError> {
        check_reference(mvref).map_err(DeviceError::invalid(DEVICE))?;
        Ok(Self {
            bus,
            address,
            mvref,
        })
    }

    /// Driver at the factory address with a 5 V reference
    pub fn with_defaults(bus: B) -> Self {
        Self {
            bus,
            address: DEFAULT_ADDRESS,
            mvref: DEFAULT_REFERENCE_MV,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn reference_voltage_mv(&self) -> f64 {
        self.mvref
    }

    /// Read one conversion as a raw code
    pub fn read_code(&mut self) -> Result<u16, DeviceError> {
        let data = self
            .bus
            .read(self.address, MCP3221_READ_LENGTH)
            .map_err(DeviceError::bus(DEVICE))?;
        let code = mcp3221_code(&data).map_err(DeviceError::bus(DEVICE))?;
        debug!("{} 0x{:02X} -> {:02X?} (code {})", DEVICE, self.address, data, code);
        Ok(code)
    }

    /// Read one conversion in millivolts
    pub fn read(&mut self) -> Result<f64, DeviceError> {
        Ok(code_to_millivolts(self.read_code()?, self.mvref))
    }

    pub fn release(self) -> B {
        self.bus
    }
}
