// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! MLX90614 infrared thermometer driver
//!
//! Registers are read with a combined write-then-read of three bytes
//! (`[low, high, pec]`). Transient bus errors are common on this part, so
//! every register read is retried according to a [`RetryPolicy`] before the
//! failure is reported.
//!
//! The driver is meant to be shared between a foreground caller and the
//! polling monitor: every method takes `&self` and the transport sits behind
//! a mutex held for the duration of each transaction.

use log::{debug, error, warn};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::bus::BusTransport;
use crate::codec::temperature::{
    bank_address, celsius_to_fahrenheit, raw_to_celsius, raw_word, register,
    self_heating_correction, RegisterBank, READ_LENGTH,
};
use crate::error::{BusError, DeviceError};

const DEVICE: &str = "MLX90614";

pub const DEFAULT_ADDRESS: u8 = 0x5A;

/// Number of attempts and pause between them for one register read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub attempts: u32,
    /// Pause before each new attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// MLX90614 driver
pub struct Mlx90614<B> {
    bus: Mutex<B>,
    address: u8,
    slot: u32,
    retry: RetryPolicy,
}

impl<B: BusTransport> Mlx90614<B> {
    /// Create the driver; `slot` only labels log lines
    pub fn new(bus: B, address: u8, slot: u32) -> Self {
        Self {
            bus: Mutex::new(bus),
            address,
            slot,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Read the raw 16-bit word of `reg` in `bank`, with retries
    pub fn read_raw(&self, reg: u8, bank: RegisterBank) -> Result<u16, DeviceError> {
        let command = bank_address(reg, bank);
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.transfer(command) {
                Ok(raw) => {
                    debug!(
                        "slot{} {} reg 0x{:02X} -> 0x{:04X}",
                        self.slot, DEVICE, command, raw
                    );
                    return Ok(raw);
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        "slot{} {} reg 0x{:02X} attempt {}/{} failed: {}",
                        self.slot, DEVICE, command, attempt, attempts, e
                    );
                    thread::sleep(self.retry.delay);
                }
                Err(e) => {
                    error!(
                        "slot{} {} reg 0x{:02X} failed after {} attempts: {}",
                        self.slot, DEVICE, command, attempt, e
                    );
                    return Err(DeviceError::RetriesExhausted {
                        device: DEVICE,
                        attempts: attempt,
                        last: e,
                    });
                }
            }
        }
    }

    /// Read a temperature register in °C
    pub fn read(&self, reg: u8, bank: RegisterBank) -> Result<f64, DeviceError> {
        self.read_raw(reg, bank).map(raw_to_celsius)
    }

    pub fn read_object_temp_c(&self) -> Result<f64, DeviceError> {
        self.read(register::TOBJ1, RegisterBank::Ram)
    }

    pub fn read_object_temp_f(&self) -> Result<f64, DeviceError> {
        self.read_object_temp_c().map(celsius_to_fahrenheit)
    }

    pub fn read_ambient_temp_c(&self) -> Result<f64, DeviceError> {
        self.read(register::TA, RegisterBank::Ram)
    }

    pub fn read_ambient_temp_f(&self) -> Result<f64, DeviceError> {
        self.read_ambient_temp_c().map(celsius_to_fahrenheit)
    }

    /// Second object zone, only populated on dual-zone parts
    pub fn read_object2_temp_c(&self) -> Result<f64, DeviceError> {
        self.read(register::TOBJ2, RegisterBank::Ram)
    }

    pub fn read_object2_temp_f(&self) -> Result<f64, DeviceError> {
        self.read_object2_temp_c().map(celsius_to_fahrenheit)
    }

    /// Object temperature in °C with the self-heating correction applied
    pub fn corrected_object_temp(&self) -> Result<f64, DeviceError> {
        let current = self.read_object_temp_c()?;
        debug!("slot{}before: {}", self.slot, current);
        Ok(self_heating_correction(current))
    }

    /// Give back the transport
    pub fn release(self) -> B {
        self.bus.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn transfer(&self, command: u8) -> Result<u16, BusError> {
        let mut bus = self.bus.lock().map_err(|_| BusError::Poisoned)?;
        let data = bus.write_and_read(self.address, &[command], READ_LENGTH)?;
        raw_word(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusTransaction, MockBus};
    use approx::assert_relative_eq;

    fn no_delay() -> RetryPolicy {
        RetryPolicy {
            attempts: 5,
            delay: Duration::ZERO,
        }
    }

    fn sensor(responses: &[&[u8]]) -> Mlx90614<MockBus> {
        let mut bus = MockBus::new();
        for r in responses {
            bus.push_response(r);
        }
        Mlx90614::new(bus, DEFAULT_ADDRESS, 1).with_retry_policy(no_delay())
    }

    #[test]
    fn test_read_object_temp() {
        // 20000 = 0x4E20
        let sensor = sensor(&[&[0x20, 0x4E, 0x00]]);
        assert_relative_eq!(sensor.read_object_temp_c().unwrap(), 126.85, epsilon = 1e-9);
        assert_eq!(
            sensor.release().transactions(),
            vec![BusTransaction::WriteRead {
                address: 0x5A,
                data: vec![0x07],
                length: 3
            }]
        );
    }

    #[test]
    fn test_read_ambient_temp_f() {
        // 0°C = 273.15 K = 13657.5 LSB, use 13658 -> 0.01°C
        let sensor = sensor(&[&[0x5A, 0x35, 0x00]]);
        assert_relative_eq!(sensor.read_ambient_temp_f().unwrap(), 32.018, epsilon = 1e-6);
        assert_eq!(
            sensor.release().transactions()[0],
            BusTransaction::WriteRead {
                address: 0x5A,
                data: vec![0x06],
                length: 3
            }
        );
    }

    #[test]
    fn test_read_eeprom_bank() {
        let sensor = sensor(&[&[0xFF, 0xFF, 0x00]]);
        assert_eq!(sensor.read_raw(register::EMISS, RegisterBank::Eeprom).unwrap(), 0xFFFF);
        assert_eq!(
            sensor.release().transactions()[0],
            BusTransaction::WriteRead {
                address: 0x5A,
                data: vec![0x24],
                length: 3
            }
        );
    }

    #[test]
    fn test_read_recovers_after_transient_failures() {
        let mut bus = MockBus::new();
        bus.fail_next(3);
        bus.push_response(&[0x20, 0x4E, 0x00]);
        let sensor = Mlx90614::new(bus, DEFAULT_ADDRESS, 2).with_retry_policy(no_delay());

        assert_relative_eq!(sensor.read_object_temp_c().unwrap(), 126.85, epsilon = 1e-9);
        assert_eq!(sensor.release().transactions().len(), 4);
    }

    #[test]
    fn test_read_gives_up_after_five_attempts() {
        let mut bus = MockBus::new();
        bus.set_fail_always(true);
        let sensor = Mlx90614::new(bus, DEFAULT_ADDRESS, 1).with_retry_policy(no_delay());

        let err = sensor.read_object_temp_c().unwrap_err();
        assert!(matches!(
            err,
            DeviceError::RetriesExhausted {
                device: "MLX90614",
                attempts: 5,
                ..
            }
        ));
        assert_eq!(sensor.release().transactions().len(), 5);
    }

    #[test]
    fn test_corrected_object_temp() {
        // 90°C -> (90 + 273.15) / 0.02 = 18157.5, use 18158 -> 90.01°C
        let sensor = sensor(&[&[0xEE, 0x46, 0x00]]);
        assert_relative_eq!(sensor.corrected_object_temp().unwrap(), 84.01, epsilon = 1e-9);
    }
}
