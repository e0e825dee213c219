mod app;
mod config;
mod error;
mod event;
mod input;
mod provider;
mod session;
mod theme;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing_subscriber::EnvFilter;

use crate::{
    app::AppState,
    config::IconSet,
    event::run,
    provider::{MockProvider, WifiProvider},
};

/// A lightweight, keyboard-driven TUI for scanning and joining nearby Wi-Fi networks
#[derive(Parser, Debug)]
#[command(
    name = "wiscan",
    about = "A lightweight, keyboard-driven TUI for scanning and joining nearby Wi-Fi networks.",
    long_about = None,
    version = env!("CARGO_PKG_VERSION"),
    disable_version_flag = true
)]
struct Args {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Use ASCII icons (no Nerd Fonts required)
    #[arg(long)]
    ascii: bool,

    /// Use a simulated Wi-Fi provider instead of the system radio
    #[arg(long)]
    mock: bool,

    /// Write diagnostic logs to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;
    init_tracing(args.log_file.as_deref())?;

    let provider: Arc<dyn WifiProvider> = if args.mock {
        Arc::new(MockProvider::demo())
    } else {
        system_provider()?
    };

    let icons = if args.ascii {
        IconSet::Ascii
    } else {
        IconSet::Nerd
    };
    let mut state = AppState::new(provider, icons);
    // Ask for the scan permission once and refresh the tracked connection
    state.session.initialize();

    let terminal = ratatui::init();
    enable_raw_mode()?;
    let result = run(terminal, &mut state).await;
    disable_raw_mode()?;

    ratatui::restore();
    result
}

#[cfg(windows)]
fn system_provider() -> Result<Arc<dyn WifiProvider>> {
    Ok(Arc::new(provider::PlatformProvider::new()))
}

#[cfg(not(windows))]
fn system_provider() -> Result<Arc<dyn WifiProvider>> {
    color_eyre::eyre::bail!("no system Wi-Fi provider for this platform; run with --mock")
}

/// Logs go to a file so they never tear the terminal UI. Without
/// `--log-file`, diagnostics are dropped.
fn init_tracing(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
