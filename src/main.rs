// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-analog-i2c project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the analog I2C peripheral tool
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rust_analog_i2c::bus::{open_bus, BusTransport};
use rust_analog_i2c::codec::Gain;
use rust_analog_i2c::config::{self, BusType, Config};
use rust_analog_i2c::daemon::Daemon;
use rust_analog_i2c::drivers::{Mcp3221, Mcp4728, Mcp47cvb02, Mlx90614, VoltageSource};
use rust_analog_i2c::logging;
use std::path::PathBuf;
use tokio::signal;

/// Drive MCP4728 / MCP47CVB02 DACs, read the MCP3221 ADC and the MLX90614 thermometer
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Bus back-end, overrides the configuration
    #[arg(long, value_enum)]
    bus: Option<BusArg>,

    /// Bus number N of /dev/i2c-N, overrides the configuration
    #[arg(long)]
    bus_device: Option<u8>,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the temperature polling daemon until Ctrl+C (default)
    Monitor {
        /// Start sampling immediately
        #[arg(long)]
        start: bool,
    },
    /// Read the MCP3221 ADC in millivolts
    ReadAdc {
        /// Number of conversions
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Read the MLX90614 thermometer
    ReadTemp {
        /// Output unit
        #[arg(short, long, value_enum, default_value_t = Unit::Celsius)]
        unit: Unit,
    },
    /// Drive one DAC channel
    DacOut {
        #[arg(value_enum)]
        device: DacKind,
        channel: u8,
        millivolts: f64,
    },
    /// Change a DAC gain
    DacGain {
        #[arg(value_enum)]
        device: DacKind,
        /// 1 or 2
        gain: u8,
        /// Use the single-channel gain command
        /// (MCP47CVB02: single-bit form, the channel is ignored)
        #[arg(long)]
        channel: Option<u8>,
    },
    /// Send the DAC reset sequence
    DacReset {
        #[arg(value_enum)]
        device: DacKind,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum BusArg {
    Mock,
    Native,
}

impl From<BusArg> for BusType {
    fn from(arg: BusArg) -> Self {
        match arg {
            BusArg::Mock => BusType::Mock,
            BusArg::Native => BusType::Native,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DacKind {
    Mcp4728,
    Mcp47cvb02,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Unit {
    Celsius,
    Fahrenheit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger with appropriate level based on verbose and quiet flags
    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logging::init_logger(log_level);

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;
    config.apply_args(args.bus.map(BusType::from), args.bus_device);

    match args.command.unwrap_or(Command::Monitor { start: false }) {
        Command::Monitor { start } => run_monitor(config, start).await,
        Command::ReadAdc { count } => {
            let settings = &config.mcp3221;
            let bus = open_bus(&config.bus)?;
            let mut adc = Mcp3221::new(bus, settings.address, settings.reference_mv)?;
            for _ in 0..count {
                println!("{:.3}", adc.read()?);
            }
            Ok(())
        }
        Command::ReadTemp { unit } => {
            let settings = &config.temperature;
            let bus = open_bus(&config.bus)?;
            let sensor = Mlx90614::new(bus, settings.address, settings.slot)
                .with_retry_policy(settings.retry_policy());
            let (object, ambient) = match unit {
                Unit::Celsius => (sensor.read_object_temp_c()?, sensor.read_ambient_temp_c()?),
                Unit::Fahrenheit => (sensor.read_object_temp_f()?, sensor.read_ambient_temp_f()?),
            };
            println!("object: {:.2}\nambient: {:.2}", object, ambient);
            Ok(())
        }
        Command::DacOut {
            device,
            channel,
            millivolts,
        } => {
            let mut dac = open_dac(&config, device, open_bus(&config.bus)?)?;
            dac.output_volt_dc(channel, millivolts)?;
            info!("{} channel {} set to {} mV", dac.name(), channel, millivolts);
            Ok(())
        }
        Command::DacGain {
            device,
            gain,
            channel,
        } => set_gain(&config, device, Gain::try_from(gain)?, channel),
        Command::DacReset { device } => {
            let mut dac = open_dac(&config, device, open_bus(&config.bus)?)?;
            dac.output_reset()?;
            info!("{} reset", dac.name());
            Ok(())
        }
    }
}

/// Run the daemon until Ctrl+C
async fn run_monitor(mut config: Config, start: bool) -> Result<()> {
    info!("Starting in daemon mode");
    config.temperature.autostart |= start;

    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;

    // Wait for termination signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, terminating daemon");
            daemon.shutdown();
            daemon.join().await?;
        }
        Err(err) => {
            eprintln!("Error waiting for shutdown signal: {}", err);
        }
    }
    Ok(())
}

fn open_dac(
    config: &Config,
    device: DacKind,
    bus: Box<dyn BusTransport>,
) -> Result<Box<dyn VoltageSource>> {
    Ok(match device {
        DacKind::Mcp4728 => {
            let c = &config.mcp4728;
            Box::new(Mcp4728::new(bus, c.address, c.reference_mv, c.gain)?)
        }
        DacKind::Mcp47cvb02 => {
            let c = &config.mcp47cvb02;
            Box::new(Mcp47cvb02::new(bus, c.address, c.reference_mv, c.gain)?)
        }
    })
}

fn set_gain(config: &Config, device: DacKind, gain: Gain, channel: Option<u8>) -> Result<()> {
    let bus = open_bus(&config.bus)?;
    match (device, channel) {
        (DacKind::Mcp4728, Some(channel)) => {
            let c = &config.mcp4728;
            let mut dac = Mcp4728::new(bus, c.address, c.reference_mv, c.gain)?;
            dac.set_single_gain(channel, gain)?;
            info!("MCP4728 channel {} gain set to {}", channel, gain);
        }
        (DacKind::Mcp47cvb02, Some(_)) => {
            let c = &config.mcp47cvb02;
            let mut dac = Mcp47cvb02::new(bus, c.address, c.reference_mv, c.gain)?;
            dac.set_single_gain(gain)?;
            info!("MCP47CVB02 gain bit set to {}", gain);
        }
        (device, None) => {
            let mut dac = open_dac(config, device, bus)?;
            dac.set_all_gain(gain)?;
            info!("{} gain set to {} on all channels", dac.name(), gain);
        }
    }
    Ok(())
}
