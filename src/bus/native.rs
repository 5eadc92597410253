// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Native I2C driver for Linux hosts
//!
//! Opens `/dev/i2c-<bus>` through rppal and exposes it through the
//! `embedded-hal` adapter.

use anyhow::{Context, Result};
use rppal::i2c::I2c;

use crate::bus::HalBus;

/// Open the Linux I2C bus `/dev/i2c-<bus>`
pub fn open(bus: u8) -> Result<HalBus<I2c>> {
    let i2c = I2c::with_bus(bus).with_context(|| format!("Failed to open /dev/i2c-{}", bus))?;
    Ok(HalBus::new(i2c))
}
