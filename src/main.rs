//! # Rover Pad
//!
//! Drive a differential-drive rover with an XInput-class gamepad.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse the command line and load the configuration
//!    - Set up logging (console, optional daily rolling file)
//!    - Open the actuator (serial ARCOS link or dry-run logger)
//!    - Detect gamepads and start one reader thread per pad
//!
//! 2. **Main Loop**
//!    - Every tick: sample all pads, run the translator, log status changes
//!      and journal the dispatched commands
//!    - Console keys: `d` toggles the dead zone, `h` toggles heading assist,
//!      `q` quits
//!    - Ctrl+C quits
//!
//! 3. **Graceful Shutdown**
//!    - Return both velocities to neutral
//!    - Flush the motion journal

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rover_pad::actuator::serial::SerialActuator;
use rover_pad::actuator::{Actuator, ActuatorGateway, TracingActuator};
use rover_pad::config::{ActuatorKind, Config, LoggingConfig};
use rover_pad::controller;
use rover_pad::controller::gamepad::Gamepad;
use rover_pad::controller::state::DeviceSnapshot;
use rover_pad::error::RoverPadError;
use rover_pad::telemetry::MotionLogger;
use rover_pad::translator::{Translator, TranslatorConfig, TranslatorState};

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Rover Pad - drive a rover from a gamepad
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults apply when it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Only log motion commands, never open the serial port
    #[arg(long)]
    dry_run: bool,
}

/// Result of one console line.
#[derive(Debug, PartialEq, Eq)]
enum Console {
    Deadzone(bool),
    HeadingAssist(bool),
    Quit,
    Ignored,
}

fn handle_console(line: &str, config: &mut TranslatorConfig) -> Console {
    match line.trim() {
        "d" | "D" => Console::Deadzone(config.toggle_deadzone()),
        "h" | "H" => Console::HeadingAssist(config.toggle_heading_assist()),
        "q" | "Q" => Console::Quit,
        _ => Console::Ignored,
    }
}

/// Loads `path`, or the defaults if the file does not exist.
///
/// The flag tells whether the file was found.
fn load_config(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }
    Ok((Config::load(path)?, true))
}

fn init_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<Option<WorkerGuard>> {
    let level = level_override.unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let (file_layer, guard) = match &config.file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "rover-pad.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn open_pads(config: &Config) -> Result<Vec<watch::Receiver<DeviceSnapshot>>> {
    let gamepads = if config.controller.device_paths.is_empty() {
        match Gamepad::discover(config.controller.max_sources) {
            Ok(pads) => pads,
            Err(RoverPadError::ControllerNotFound) => {
                warn!("No gamepad found, all controllers will show as not connected");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        Gamepad::open_paths(&config.controller.device_paths)?
    };

    let mut pads = Vec::with_capacity(gamepads.len());
    for (source, pad) in gamepads.into_iter().enumerate() {
        info!("Controller {}: {}", source, pad.device_path());
        let (rx, _handle) = pad.spawn_poller(source, config.controller.trigger_max)?;
        pads.push(rx);
    }
    Ok(pads)
}

async fn run<A: Actuator>(actuator: A, config: &Config, pads: Vec<watch::Receiver<DeviceSnapshot>>) -> Result<()> {
    let translator = Translator::new(ActuatorGateway::new(actuator));
    let mut state = TranslatorState::new(TranslatorConfig::from(&config.translator));

    let mut journal = if config.telemetry.enabled {
        Some(MotionLogger::new(&config.telemetry)?)
    } else {
        None
    };

    let mut ticker = interval(Duration::from_millis(config.translator.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;

    info!(
        "Translating every {} ms (dead zone {}, heading assist {})",
        config.translator.tick_interval_ms,
        if state.config.deadzone_enabled { "on" } else { "off" },
        if state.config.heading_assist_enabled { "on" } else { "off" },
    );
    info!("Keys: d = dead zone, h = heading assist, q = quit (then Enter)");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshots = controller::sample(&pads);
                let report = translator.tick(&mut state, &snapshots, Instant::now()).await;

                if report.refresh {
                    info!("\n{}", state.tracker().messages().join("\n"));
                }

                if let Some(logger) = journal.as_mut() {
                    if let Err(e) = logger.log_all(&report.dispatched) {
                        warn!("Motion journal disabled: {}", e);
                        journal = None;
                    }
                }
            }

            line = console.next_line(), if console_open => {
                match line {
                    Ok(Some(line)) => match handle_console(&line, &mut state.config) {
                        Console::Deadzone(on) => info!("Dead zone {}", if on { "enabled" } else { "disabled" }),
                        Console::HeadingAssist(on) => info!("Heading assist {}", if on { "enabled" } else { "disabled" }),
                        Console::Quit => {
                            info!("Quit requested, shutting down...");
                            break;
                        }
                        Console::Ignored => {}
                    },
                    Ok(None) => console_open = false,
                    Err(e) => {
                        warn!("Console closed: {}", e);
                        console_open = false;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    translator.gateway().revert().await?;
    if let Some(journal) = journal.as_mut() {
        journal.flush()?;
    }
    info!("Rover stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, found) = load_config(&cli.config)?;
    let _log_guard = init_logging(&config.logging, cli.log_level.as_deref())?;

    info!("Rover Pad v{} starting...", env!("CARGO_PKG_VERSION"));
    if found {
        info!("Configuration file: {}", cli.config.display());
    } else {
        warn!("{} not found, using defaults", cli.config.display());
    }

    let pads = open_pads(&config)?;

    match config.actuator.kind {
        ActuatorKind::Serial if !cli.dry_run => {
            let ports = config.serial.candidate_ports();
            let mut actuator = SerialActuator::open_first(&ports, config.serial.baud_rate)?;
            actuator.enable_motors().await?;
            run(actuator, &config, pads).await
        }
        _ => {
            info!("Dry run: motion commands are only logged");
            run(TracingActuator::new(), &config, pads).await
        }
    }
}
