// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for device inspection
//!
//! This module provides command-line functionality for:
//! - Listing devices, windows and desktops
//! - Showing camera formats and format negotiation
//! - Watching for device changes

use chrono::Local;
use media_devices::constants::timing::WATCH_INTERVAL;
use media_devices::{
    Config, DeviceCategory, DeviceError, DeviceManager, DeviceSnapshot, FourCc, VideoFormat,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Granularity of the watch loop's stop check
const WATCH_TICK: Duration = Duration::from_millis(200);

/// Host manager with the user's configuration applied
pub fn build_manager(config_path: Option<&Path>) -> Result<DeviceManager, Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(DeviceManager::from_config(&config))
}

/// List every device category
pub fn list_devices(manager: &DeviceManager) -> Result<(), Box<dyn std::error::Error>> {
    for category in DeviceCategory::ALL {
        let devices = manager.devices(category)?;

        println!("{} devices:", capitalize(&category.to_string()));
        if devices.is_empty() {
            println!("  (none)");
        }
        for (index, device) in devices.iter().enumerate() {
            println!("  [{}] {}", index, device.name);
            println!("      id: {}", device.id);
            if category == DeviceCategory::VideoCapture
                && let Some(max) = manager.max_format_for(device)
            {
                println!("      max format: {}", max);
            }
        }
        println!();
    }

    Ok(())
}

/// List capturable windows
pub fn list_windows(manager: &DeviceManager) -> Result<(), Box<dyn std::error::Error>> {
    let windows = match manager.windows() {
        Err(e) if e.is_unsupported() => {
            println!("Window capture is not supported in this session.");
            return Ok(());
        }
        other => other?,
    };

    if windows.is_empty() {
        println!("No windows found.");
    }
    for window in windows {
        println!("  {:#010x}  {}", window.id.0, window.title);
    }
    Ok(())
}

/// List capturable desktops
pub fn list_desktops(manager: &DeviceManager) -> Result<(), Box<dyn std::error::Error>> {
    let desktops = match manager.desktops() {
        Err(e) if e.is_unsupported() => {
            println!("Desktop capture is not supported in this session.");
            return Ok(());
        }
        other => other?,
    };

    if desktops.is_empty() {
        println!("No desktops found.");
    }
    for desktop in desktops {
        let marker = if desktop.primary { "*" } else { " " };
        println!("{} [{}] {}", marker, desktop.id.0, desktop.title);
    }
    Ok(())
}

/// Print a camera's formats and the best match for the request
pub fn show_formats(
    manager: &DeviceManager,
    device_name: &str,
    width: u32,
    height: u32,
    fps: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = manager.video_capture_device(device_name)?;
    let capturer = manager.create_video_capturer(&device)?;

    println!("Camera: {}", device.name);
    if let Some(max) = capturer.max_format() {
        println!("Max format: {}", max);
    }

    let formats = capturer.supported_formats();
    if formats.is_empty() {
        return Err(DeviceError::NotFound(format!("formats for {}", device.name)).into());
    }

    println!("Supported formats:");
    for format in formats {
        println!("  {}", format);
    }

    let desired = VideoFormat::with_fps(width, height, fps, FourCc::ANY);
    match capturer.best_capture_format(&desired) {
        Some(best) => println!("Best match for {}x{}@{}: {}", width, height, fps, best),
        None => println!("No format matches {}x{}@{}", width, height, fps),
    }
    Ok(())
}

/// Poll the device lists and report changes until Ctrl+C
pub fn watch(manager: &DeviceManager, interval_secs: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let interval = interval_secs
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(WATCH_INTERVAL);

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let mut previous = DeviceSnapshot::capture(manager)?;
    info!(interval_secs = interval.as_secs(), "Watching for device changes");
    println!("Watching for device changes (Ctrl+C to stop)...");

    let mut last_poll = Instant::now();
    while !stop_flag.load(Ordering::SeqCst) {
        // Sleep in short steps so Ctrl+C is handled promptly
        std::thread::sleep(WATCH_TICK.min(interval));
        if last_poll.elapsed() < interval {
            continue;
        }
        last_poll = Instant::now();

        let current = DeviceSnapshot::capture(manager)?;
        let changes = current.changes_since(&previous);
        let timestamp = Local::now().format("%H:%M:%S");

        for (category, device) in &changes.added {
            println!("{} + {}: {} ({})", timestamp, category, device.name, device.id);
        }
        for (category, device) in &changes.removed {
            println!("{} - {}: {} ({})", timestamp, category, device.name, device.id);
        }

        previous = current;
    }

    println!();
    println!("Stopped watching.");
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
