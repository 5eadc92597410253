// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! `embedded-hal` adapter
//!
//! Wraps any `embedded_hal::i2c::I2c` implementation (Linux i2cdev, USB bridges,
//! MCU peripherals behind a std shim) so it can be used as a [`BusTransport`].

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::bus::BusTransport;
use crate::error::BusError;

/// Transport backed by an `embedded-hal` I2C bus
pub struct HalBus<I> {
    i2c: I,
}

impl<I: I2c> HalBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Release the wrapped bus
    pub fn release(self) -> I {
        self.i2c
    }
}

fn map_error<E: embedded_hal::i2c::Error>(address: u8, error: E) -> BusError {
    match error.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::Nack(address),
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLost,
        kind => BusError::Fault(format!("{:?}", kind)),
    }
}

impl<I: I2c + Send> BusTransport for HalBus<I> {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.i2c
            .write(address, data)
            .map_err(|e| map_error(address, e))
    }

    fn read(&mut self, address: u8, length: usize) -> Result<Vec<u8>, BusError> {
        let mut buffer = vec![0u8; length];
        self.i2c
            .read(address, &mut buffer)
            .map_err(|e| map_error(address, e))?;
        Ok(buffer)
    }

    fn write_and_read(
        &mut self,
        address: u8,
        data: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, BusError> {
        let mut buffer = vec![0u8; length];
        self.i2c
            .write_read(address, data, &mut buffer)
            .map_err(|e| map_error(address, e))?;
        Ok(buffer)
    }
}
