// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::bus::{open_bus, BusTransport, SharedBus};
use crate::config::Config;
use crate::daemon::monitor::TemperatureMonitor;
use crate::drivers::Mlx90614;

/// Bus handle shared by every driver the daemon creates
pub type DaemonBus = SharedBus<Box<dyn BusTransport>>;

/// Represents a daemon task that can be started and managed
pub struct Daemon {
    bus: Option<DaemonBus>,
    monitor: Option<TemperatureMonitor<DaemonBus>>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            bus: None,
            monitor: None,
        }
    }

    /// Open the bus and launch all configured tasks
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        let bus = SharedBus::new(open_bus(&config.bus)?);
        self.bus = Some(bus.clone());

        if config.temperature.enabled {
            self.start_temperature_monitor(config, bus)?;
        }

        Ok(())
    }

    /// Spawn the thermometer polling task
    fn start_temperature_monitor(&mut self, config: &Config, bus: DaemonBus) -> Result<()> {
        let settings = &config.temperature;
        info!(
            "Starting temperature monitor for slot{} at 0x{:02X} (interval: {:?})",
            settings.slot,
            settings.address,
            settings.poll_interval()
        );

        let sensor = Mlx90614::new(bus, settings.address, settings.slot)
            .with_retry_policy(settings.retry_policy());
        let monitor = TemperatureMonitor::spawn(Arc::new(sensor), settings.poll_interval());

        if settings.autostart {
            let status = monitor.read_start();
            info!("slot{} {}", settings.slot, status);
        }

        self.monitor = Some(monitor);
        Ok(())
    }

    /// Shared bus opened by [`Daemon::launch`]
    pub fn bus(&self) -> Option<&DaemonBus> {
        self.bus.as_ref()
    }

    /// Temperature monitor, when enabled in the configuration
    pub fn monitor(&self) -> Option<&TemperatureMonitor<DaemonBus>> {
        self.monitor.as_ref()
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        if let Some(monitor) = &self.monitor {
            monitor.shutdown();
        }
    }

    /// Wait for all tasks to complete
    pub async fn join(self) -> Result<()> {
        if let Some(monitor) = self.monitor {
            monitor.join().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time;

    #[tokio::test]
    async fn test_launch_with_mock_bus() {
        let mut config = Config::default();
        config.temperature.poll_interval_ms = 5;
        config.temperature.retry_delay_ms = 0;
        config.temperature.autostart = true;

        let mut daemon = Daemon::new();
        daemon.launch(&config).await.unwrap();

        let monitor = daemon.monitor().unwrap();
        assert!(monitor.is_active());
        assert_eq!(monitor.sensor().slot(), 1);

        time::sleep(Duration::from_millis(40)).await;
        daemon.shutdown();
        daemon.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_launch_without_thermometer() {
        let mut config = Config::default();
        config.temperature.enabled = false;

        let mut daemon = Daemon::new();
        daemon.launch(&config).await.unwrap();
        assert!(daemon.monitor().is_none());
        assert!(daemon.bus().is_some());

        daemon.shutdown();
        daemon.join().await.unwrap();
    }
}
