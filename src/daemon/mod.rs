// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Module
//!
//! Background services built on top of the drivers.
//!
//! ## Components
//!
//! * **Launch Daemon**: opens the configured bus, starts the background tasks
//!   and shuts them down cleanly
//! * **Monitor**: periodic corrected temperature sampling with start/stop
//!   control
//!
//! ## Usage
//!
//! ```no_run
//! use rust_analog_i2c::{config::Config, daemon::Daemon};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!
//!     let mut daemon = Daemon::new();
//!     daemon.launch(&config).await?;
//!
//!     // Wait for shutdown signal (e.g., Ctrl+C)
//!     tokio::signal::ctrl_c().await?;
//!
//!     daemon.shutdown();
//!     daemon.join().await?;
//!     Ok(())
//! }
//! ```

pub mod launch_daemon;
pub mod monitor;

pub use launch_daemon::{Daemon, DaemonBus};
pub use monitor::TemperatureMonitor;
