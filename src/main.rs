// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "media-devices")]
#[command(about = "Inspect audio, video and screen capture devices")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio inputs, audio outputs and cameras
    List,

    /// List capturable windows
    Windows,

    /// List capturable desktops
    Desktops,

    /// Show the formats of a camera and the best match for a request
    Formats {
        /// Camera name (default: first camera)
        #[arg(short, long, default_value = "")]
        device: String,

        /// Requested width
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Requested height
        #[arg(long, default_value = "720")]
        height: u32,

        /// Requested frame rate
        #[arg(long, default_value = "30")]
        fps: u32,
    },

    /// Report devices as they are added and removed
    Watch {
        /// Poll interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=media_devices=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut manager = cli::build_manager(cli.config.as_deref())?;
    manager.init()?;

    let result = match cli.command {
        Commands::List => cli::list_devices(&manager),
        Commands::Windows => cli::list_windows(&manager),
        Commands::Desktops => cli::list_desktops(&manager),
        Commands::Formats {
            device,
            width,
            height,
            fps,
        } => cli::show_formats(&manager, &device, width, height, fps),
        Commands::Watch { interval } => cli::watch(&manager, interval),
    };

    manager.terminate();
    result
}
