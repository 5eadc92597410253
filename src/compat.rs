// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sentinel-valued temperature API
//!
//! Older integrations expect the thermometer calls to return a plain number
//! and to signal a failed read with `-999`. [`LegacyThermometer`] reproduces
//! that surface on top of [`Mlx90614`], including the fact that the
//! Fahrenheit calls run the sentinel through the conversion formula
//! (`-999 °C` becomes `-1766.2`).
//!
//! New code should call the driver directly and handle the `Result`.

use crate::bus::BusTransport;
use crate::codec::temperature::{celsius_to_fahrenheit, self_heating_correction, RegisterBank};
use crate::drivers::Mlx90614;
use crate::error::DeviceError;

/// Value returned in place of a temperature when every read attempt failed
pub const READ_FAILURE_SENTINEL: f64 = -999.0;

/// Collapse a read result into the legacy sentinel convention
pub fn or_sentinel(result: Result<f64, DeviceError>) -> f64 {
    result.unwrap_or(READ_FAILURE_SENTINEL)
}

/// Legacy view over an [`Mlx90614`]
pub struct LegacyThermometer<'a, B> {
    sensor: &'a Mlx90614<B>,
}

impl<'a, B: BusTransport> LegacyThermometer<'a, B> {
    pub fn new(sensor: &'a Mlx90614<B>) -> Self {
        Self { sensor }
    }

    pub fn read(&self, register: u8, bank: RegisterBank) -> f64 {
        or_sentinel(self.sensor.read(register, bank))
    }

    pub fn read_object_temp_c(&self) -> f64 {
        or_sentinel(self.sensor.read_object_temp_c())
    }

    pub fn read_object_temp_f(&self) -> f64 {
        celsius_to_fahrenheit(self.read_object_temp_c())
    }

    pub fn read_ambient_temp_c(&self) -> f64 {
        or_sentinel(self.sensor.read_ambient_temp_c())
    }

    pub fn read_ambient_temp_f(&self) -> f64 {
        celsius_to_fahrenheit(self.read_ambient_temp_c())
    }

    /// Corrected object temperature; the sentinel is below every tier and
    /// comes back unchanged
    pub fn get_obj_temp(&self) -> f64 {
        self_heating_correction(self.read_object_temp_c())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockBus;
    use crate::drivers::mlx90614::RetryPolicy;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn failing_sensor() -> Mlx90614<MockBus> {
        let mut bus = MockBus::new();
        bus.set_fail_always(true);
        Mlx90614::new(bus, 0x5A, 1).with_retry_policy(RetryPolicy {
            attempts: 5,
            delay: Duration::ZERO,
        })
    }

    #[test]
    fn test_sentinel_after_exactly_five_attempts() {
        let sensor = failing_sensor();
        let legacy = LegacyThermometer::new(&sensor);

        assert_eq!(legacy.read_object_temp_c(), READ_FAILURE_SENTINEL);
        assert_eq!(sensor.release().transactions().len(), 5);
    }

    #[test]
    fn test_fahrenheit_converts_sentinel() {
        let sensor = failing_sensor();
        let legacy = LegacyThermometer::new(&sensor);

        assert_relative_eq!(legacy.read_ambient_temp_f(), -1766.2, epsilon = 1e-9);
        assert_relative_eq!(legacy.read_object_temp_f(), -1766.2, epsilon = 1e-9);
        assert_eq!(legacy.get_obj_temp(), READ_FAILURE_SENTINEL);
    }

    #[test]
    fn test_successful_reads_pass_through() {
        let mut bus = MockBus::new();
        bus.push_response(&[0x20, 0x4E, 0x00]);
        let sensor = Mlx90614::new(bus, 0x5A, 1);
        let legacy = LegacyThermometer::new(&sensor);

        assert_relative_eq!(legacy.read(0x07, RegisterBank::Ram), 126.85, epsilon = 1e-9);
    }
}
