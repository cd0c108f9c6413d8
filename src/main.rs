//! Touchpad Emulator
//!
//! Entry point for the emulator binary.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use touchpad_emulator::config::{Config, DEFAULT_CONFIG_PATH};
use touchpad_emulator::engine::Rotation;
use touchpad_emulator::runtime::TouchpadEmulator;
use touchpad_emulator::utils::{format_user_error, RuntimeStats};

/// Command-line arguments for touchpad-emulator
#[derive(Parser, Debug)]
#[command(name = "touchpad-emulator")]
#[command(version, about = "Use a phone touchscreen as a laptop touchpad", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Fixed rotation in degrees (0, 90, 180, 270); disables the sensor
    #[arg(short, long, env = "TOUCHPAD_EMULATOR_ROTATION", value_parser = parse_rotation)]
    pub rotation: Option<u16>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<String>,
}

fn parse_rotation(value: &str) -> Result<u16, String> {
    let degrees: u16 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Rotation::from_degrees(degrees)
        .map(|_| degrees)
        .ok_or_else(|| format!("rotation must be 0, 90, 180 or 270, got {}", degrees))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = init_logging(&args)?;

    info!("════════════════════════════════════════════════════════");
    info!("  touchpad-emulator v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {}", env!("BUILD_STAMP"));
    info!("  Commit: {}", env!("GIT_REVISION"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    touchpad_emulator::utils::log_startup_diagnostics();
    let stats = RuntimeStats::new();

    // Load configuration
    let config = Config::load(&args.config).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {:#}, using defaults", e);
        Config::default_config()
    });

    // Override config with CLI args
    let config = config.with_overrides(args.rotation);

    info!("Configuration loaded successfully");
    tracing::debug!("Config: {:?}", config);

    let emulator = match TouchpadEmulator::new(config).await {
        Ok(emulator) => emulator,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };

    if let Err(e) = emulator.run().await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    info!("Touchpad emulator exited after {}", stats.uptime_string());
    Ok(())
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // zbus is chatty at debug; keep it at warn unless RUST_LOG says otherwise
        tracing_subscriber::EnvFilter::new(format!(
            "touchpad_emulator={level},zbus=warn,warn",
            level = log_level
        ))
    });

    // If log file is specified, write to both stdout and file
    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)?;
        let (file_writer, guard) = tracing_appender::non_blocking(file);

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path);
        Ok(Some(guard))
    } else {
        // Stdout only
        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact())
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .init();
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["touchpad-emulator"]).unwrap();
        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
        assert_eq!(args.verbose, 0);
        assert_eq!(args.log_format, "pretty");
    }

    #[test]
    fn test_build_identification() {
        assert!(!env!("BUILD_STAMP").is_empty());
        assert!(!env!("GIT_REVISION").is_empty());
    }

    #[test]
    fn test_rotation_argument() {
        let args = Args::try_parse_from(["touchpad-emulator", "--rotation", "270", "-vv"]).unwrap();
        assert_eq!(args.rotation, Some(270));
        assert_eq!(args.verbose, 2);

        assert!(Args::try_parse_from(["touchpad-emulator", "--rotation", "45"]).is_err());
        assert!(Args::try_parse_from(["touchpad-emulator", "--rotation", "up"]).is_err());
    }
}
