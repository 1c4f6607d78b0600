//! # Sensor Hub Binary
//!
//! Shows frames from one capture device overlaid with the latest values of
//! three synthetic counter sensors. Press `q` + Enter to quit.
//!
//! # Usage
//!
//! ```bash
//! # Camera 0 at 640x480, 30 fps
//! sensor_hub --cam 0 --res 640x480 --fps 30
//!
//! # Custom configuration and verbose logging
//! sensor_hub --cam 1 --res 1280x720 --fps 15 --config hub.toml -v
//! ```

use clap::Parser;
use sensor_common::consts::VIEW_TITLE;
use sensor_common::frame::Resolution;
use sensor_hub::config::HubConfig;
use sensor_hub::drivers::builtin_registry;
use sensor_hub::error::HubError;
use sensor_hub::logging::{LogOptions, init_tracing};
use sensor_hub::render::{ConsoleRenderer, LabelOverlay};
use sensor_hub::{CaptureSettings, SensorHub, ShutdownReason};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;

/// Sensor Hub - live camera view with periodic sensor overlays
#[derive(Parser, Debug)]
#[command(name = "sensor_hub")]
#[command(version)]
#[command(about = "Live camera view with periodic sensor overlays")]
#[command(long_about = None)]
struct Args {
    /// Capture device id
    #[arg(long, value_name = "ID")]
    cam: u32,

    /// Capture resolution
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    res: Resolution,

    /// Target capture rate in frames per second
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Optional hub configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Capture driver, overrides the configured one
    #[arg(short, long)]
    driver: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output console logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Sensor hub startup failed: {}", e);
        eprintln!("sensor_hub: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), HubError> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HubConfig::from_file(path)?,
        None => HubConfig::default(),
    };

    init_tracing(&LogOptions {
        level: if args.verbose {
            LevelFilter::DEBUG
        } else {
            config.shared.log_level.into()
        },
        json: args.json,
        error_log: config.logging.error_log_path(),
    })?;

    info!(
        "Sensor Hub v{} starting as '{}'...",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let driver = args.driver.clone().unwrap_or_else(|| config.driver.clone());
    let settings = CaptureSettings {
        device_id: args.cam,
        resolution: args.res,
        fps: args.fps,
    };
    let hub = SensorHub::new(config, settings);

    let shutdown = hub.shutdown_signal();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        shutdown.set_with(ShutdownReason::Interrupted);
    })
    .map_err(|e| HubError::SignalHandler(e.to_string()))?;

    let device = hub.create_device(&builtin_registry(), &driver)?;

    let renderer = ConsoleRenderer::new(VIEW_TITLE);
    renderer
        .watch_stdin()
        .map_err(|e| HubError::spawn("stdin-quit", e))?;

    let report = hub.run(device, renderer, LabelOverlay::default())?;

    for counter in &report.counters {
        match counter.value {
            Some(value) => info!("{}: final value {}", counter.name, value),
            None => warn!("{}: still running at exit", counter.name),
        }
    }
    if let Some(stats) = report.compositor.release.frame_stats {
        info!(
            "Captured {} frames ({} overruns, max capture {}us)",
            stats.frames, stats.overruns, stats.max_capture_time_us
        );
    }
    info!(
        "Sensor Hub shutdown complete after {} views ({})",
        report.compositor.ticks,
        report
            .compositor
            .reason
            .map_or_else(|| "no reason".to_string(), |r| r.to_string())
    );
    Ok(())
}
