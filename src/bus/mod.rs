// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! I2C bus transports
//!
//! This module provides the transport abstraction used by every device driver
//! and the available implementations:
//! - Mock: in-memory bus recording transactions, for tests and dry runs
//! - HAL: adapter for any `embedded-hal` 1.0 I2C implementation
//! - Native: Linux `/dev/i2c-*` access through rppal
//!
//! All transactions are synchronous and blocking. A transport handles one
//! transaction at a time; use [`SharedBus`] when several drivers sit on the
//! same physical bus.

pub mod hal;
pub mod mock;
#[cfg(target_os = "linux")]
pub mod native;

pub use hal::HalBus;
pub use mock::{BusTransaction, MockBus};

use anyhow::Result;
use log::info;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{BusConfig, BusType};
use crate::error::BusError;

/// I2C bus transport trait for hardware abstraction
pub trait BusTransport: Send {
    /// Write `data` to the device at `address`
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError>;

    /// Read `length` bytes from the device at `address`
    fn read(&mut self, address: u8, length: usize) -> Result<Vec<u8>, BusError>;

    /// Write `data` then read `length` bytes in one combined transaction
    fn write_and_read(
        &mut self,
        address: u8,
        data: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, BusError>;
}

impl<T: BusTransport + ?Sized> BusTransport for Box<T> {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u8, length: usize) -> Result<Vec<u8>, BusError> {
        (**self).read(address, length)
    }

    fn write_and_read(
        &mut self,
        address: u8,
        data: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, BusError> {
        (**self).write_and_read(address, data, length)
    }
}

/// Transport shared between several drivers
///
/// Every transaction takes the inner lock for its whole duration, so two
/// drivers (or a driver and the polling monitor) never interleave bytes on
/// the wire.
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: BusTransport> SharedBus<B> {
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    /// Lock the underlying transport, e.g. to inspect a [`MockBus`]
    pub fn lock(&self) -> Result<MutexGuard<'_, B>, BusError> {
        self.inner.lock().map_err(|_| BusError::Poisoned)
    }
}

impl<B: BusTransport> BusTransport for SharedBus<B> {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.lock()?.write(address, data)
    }

    fn read(&mut self, address: u8, length: usize) -> Result<Vec<u8>, BusError> {
        self.lock()?.read(address, length)
    }

    fn write_and_read(
        &mut self,
        address: u8,
        data: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, BusError> {
        self.lock()?.write_and_read(address, data, length)
    }
}

/// Create the transport described by the configuration
pub fn open_bus(config: &BusConfig) -> Result<Box<dyn BusTransport>> {
    match config.bus_type {
        BusType::Mock => {
            info!("Using mock I2C bus");
            Ok(Box::new(MockBus::new()))
        }
        BusType::Native => open_native(config.device),
    }
}

#[cfg(target_os = "linux")]
fn open_native(device: u8) -> Result<Box<dyn BusTransport>> {
    info!("Opening native I2C bus /dev/i2c-{}", device);
    Ok(Box::new(native::open(device)?))
}

#[cfg(not(target_os = "linux"))]
fn open_native(device: u8) -> Result<Box<dyn BusTransport>> {
    anyhow::bail!(
        "Native I2C bus /dev/i2c-{} is only available on Linux",
        device
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_bus_clones_see_same_transport() {
        let bus = SharedBus::new(MockBus::new());
        let mut a = bus.clone();
        let mut b = bus.clone();

        a.write(0x60, &[0x01]).unwrap();
        b.write(0x61, &[0x02]).unwrap();

        let log = bus.lock().unwrap().transactions();
        assert_eq!(log.len(), 2);
        assert_eq!(
            log[1],
            BusTransaction::Write {
                address: 0x61,
                data: vec![0x02]
            }
        );
    }

    #[test]
    fn test_shared_bus_across_threads() {
        let bus = SharedBus::new(MockBus::new());

        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let mut bus = bus.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        bus.write(0x40 + i, &[i, i]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(bus.lock().unwrap().transactions().len(), 100);
    }

    #[test]
    fn test_boxed_transport() {
        let mut bus: Box<dyn BusTransport> = Box::new(MockBus::new());
        let data = bus.read(0x4E, 2).unwrap();
        assert_eq!(data, vec![0, 0]);
    }

    #[test]
    fn test_open_mock_bus() {
        let config = BusConfig {
            bus_type: BusType::Mock,
            device: 1,
        };
        let mut bus = open_bus(&config).unwrap();
        assert!(bus.write(0x60, &[0x00, 0x00]).is_ok());
    }
}
