//! Bolt-lock console.
//!
//! Runs one lock with a simulated motor. Commands are read from stdin,
//! notifications and replies are written to stdout as JSON lines, logs go to
//! stderr.

use std::{path::PathBuf, process::ExitCode, time::Duration};

use boltlock_app::{AppError, ConsoleDriver, Runtime};
use boltlock_core::{BootState, DeviceConfig, LockDevice};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Bolt-lock controller console
#[derive(Parser, Debug)]
#[command(name = "boltlock")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON device configuration; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time one motor motion takes
    #[arg(long, default_value = "800")]
    motor_ms: u64,

    /// Timer tick interval
    #[arg(long, default_value = "100")]
    tick_ms: u64,

    /// Boot with the bolt retracted
    #[arg(long)]
    boot_unlocked: bool,

    /// Refuse remote commands without a valid PIN
    #[arg(long)]
    require_pin: bool,

    /// Relock this long after an unlock
    #[arg(long)]
    auto_relock_ms: Option<u64>,

    /// Number of user slots
    #[arg(long)]
    slots: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn device_config(&self) -> Result<DeviceConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str::<DeviceConfig>(&text)
                    .map_err(|source| AppError::ConfigFile { path: path.clone(), source })?
            },
            None => DeviceConfig::default(),
        };

        if self.boot_unlocked {
            config.boot_state = BootState::Unlocked;
        }
        if self.require_pin {
            config.require_pin_for_remote = true;
        }
        if let Some(delay) = self.auto_relock_ms {
            config.auto_relock_ms = Some(delay);
        }
        if let Some(slots) = self.slots {
            config.user_slots = slots;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "boltlock failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: &Cli) -> Result<(), AppError> {
    let config = cli.device_config()?;
    let device = LockDevice::new(config)?;
    tracing::info!(config = ?device.config(), "device ready");

    let driver = ConsoleDriver::new(tokio::io::stdout(), Duration::from_millis(cli.motor_ms));
    let _reader = driver.spawn_reader(BufReader::new(tokio::io::stdin()));

    let mut runtime = Runtime::new(device, driver, Duration::from_millis(cli.tick_ms));
    runtime.run().await
}
