// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mock I2C bus
//!
//! Records every transaction for later verification and serves pre-programmed
//! read responses. Reads with no queued response return zero-filled buffers,
//! which lets the binary run end to end without hardware.
//!
//! Failures can be injected either for the next `n` transactions or for every
//! transaction, to exercise the retry and propagation paths of the drivers.

use log::debug;
use std::collections::VecDeque;

use crate::bus::BusTransport;
use crate::error::BusError;

/// Transaction recorded by [`MockBus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusTransaction {
    Write {
        address: u8,
        data: Vec<u8>,
    },
    Read {
        address: u8,
        length: usize,
    },
    WriteRead {
        address: u8,
        data: Vec<u8>,
        length: usize,
    },
}

/// In-memory bus for tests and dry runs
#[derive(Debug, Default)]
pub struct MockBus {
    transactions: Vec<BusTransaction>,
    responses: VecDeque<Vec<u8>>,
    fail_next: usize,
    fail_always: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the bytes returned by the next read or write-read
    pub fn push_response(&mut self, data: &[u8]) {
        self.responses.push_back(data.to_vec());
    }

    /// Make the next `count` transactions fail with a NACK
    pub fn fail_next(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Make every transaction fail until reset with `false`
    pub fn set_fail_always(&mut self, fail: bool) {
        self.fail_always = fail;
    }

    /// Transaction log, in order (failed attempts included)
    pub fn transactions(&self) -> Vec<BusTransaction> {
        self.transactions.clone()
    }

    /// Data of every successful or attempted write, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.transactions
            .iter()
            .filter_map(|t| match t {
                BusTransaction::Write { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    fn check_failure(&mut self, address: u8) -> Result<(), BusError> {
        if self.fail_always {
            return Err(BusError::Nack(address));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BusError::Nack(address));
        }
        Ok(())
    }

    fn next_response(&mut self, length: usize) -> Vec<u8> {
        let mut data = self.responses.pop_front().unwrap_or_default();
        data.resize(length, 0);
        data
    }
}

impl BusTransport for MockBus {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.transactions.push(BusTransaction::Write {
            address,
            data: data.to_vec(),
        });
        self.check_failure(address)?;
        debug!("mock write 0x{:02X}: {:02X?}", address, data);
        Ok(())
    }

    fn read(&mut self, address: u8, length: usize) -> Result<Vec<u8>, BusError> {
        self.transactions.push(BusTransaction::Read { address, length });
        self.check_failure(address)?;
        Ok(self.next_response(length))
    }

    fn write_and_read(
        &mut self,
        address: u8,
        data: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, BusError> {
        self.transactions.push(BusTransaction::WriteRead {
            address,
            data: data.to_vec(),
            length,
        });
        self.check_failure(address)?;
        Ok(self.next_response(length))
    }
}
