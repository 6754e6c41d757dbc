//! Harbor Player
//!
//! Usage:
//!   harbor-player [--config <harbor.toml>] [--state <path>] [--resources <dir>] [--fullscreen]

use anyhow::{Context, Result};
use clap::Parser;
use harbor_player::{PlayerApp, PlayerConfig, ProgramState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

const DEFAULT_LOG_DIRECTIVE: &str = "harbor=info";

#[derive(Parser)]
#[command(name = "harbor-player")]
#[command(about = "Fly around a harbor scene rendered with HDR bloom")]
struct Args {
    /// Player configuration file
    #[arg(long, default_value = "harbor.toml")]
    config: PathBuf,

    /// Where the camera pose and clear color are saved between runs
    #[arg(long, default_value = "resources/program_state.toml")]
    state: PathBuf,

    /// Override the resources directory from the config
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Launch in fullscreen mode
    #[arg(long)]
    fullscreen: bool,

    /// Log filter directive, e.g. "harbor=debug"
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'"))?
        }
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref())?;

    let mut config = PlayerConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(resources) = args.resources {
        config.resources = resources;
    }

    let state = match ProgramState::load(&args.state) {
        Ok(Some(state)) => state,
        Ok(None) => ProgramState::default(),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable program state");
            ProgramState::default()
        }
    };

    println!("Controls:");
    println!("  WASD       - Move");
    println!("  Mouse      - Look");
    println!("  Scroll     - Zoom");
    println!("  B / Space  - Toggle bloom");
    println!("  Q / E      - Exposure down / up");
    println!("  Escape     - Release cursor / Exit");
    println!("  F1         - Toggle debug mode");
    println!("  F11        - Toggle fullscreen");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlayerApp::new(config, state, args.state, args.fullscreen);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
