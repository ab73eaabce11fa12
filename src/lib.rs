// SPDX-License-Identifier: MPL-2.0

//! Media Devices - audio, video and screen capture device management
//!
//! This library discovers the capture devices of the running system,
//! normalizes them into a uniform [`Device`] model, applies exclusion and
//! max-format policy, and builds capturers bound to a chosen device.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`manager`]: The [`DeviceManager`] tying everything together
//! - [`backends`]: Platform enumerators, capturers and window pickers
//! - [`filter`]: Exclusion filtering of device lists
//! - [`subsystem`]: Platform subsystem reference counting
//! - [`snapshot`]: Device change detection
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use media_devices::DeviceManager;
//!
//! let mut manager = DeviceManager::new();
//! manager.init()?;
//! for camera in manager.video_capture_devices()? {
//!     println!("{}", camera);
//! }
//! manager.terminate();
//! # Ok::<(), media_devices::DeviceError>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod manager;
pub mod snapshot;
pub mod subsystem;

// Re-export commonly used types
pub use backends::camera::VideoCapturer;
pub use backends::types::{
    DesktopDescription, DesktopId, Device, FourCc, ScreencastId, VideoFormat, WindowDescription, WindowId,
};
pub use config::Config;
pub use constants::{DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, WILDCARD};
pub use errors::{DeviceError, DeviceResult};
pub use manager::{DeviceCategory, DeviceManager, DeviceManagerBuilder};
pub use snapshot::{DeviceChanges, DeviceSnapshot};
