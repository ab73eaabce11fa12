// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! This module covers everything between a [`Device`] and a configured
//! capturer: enumeration, capturer construction and format negotiation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        DeviceManager         │  ← Whitelist lookup, factory selection
//! └──────────────┬───────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │ VideoDeviceCapturerFactory   │  ← Device → capturer
//! │ ScreenCapturerFactory        │  ← Window/desktop → capturer
//! └──────────────┬───────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  VideoCapturer Trait         │  ← Formats, ceiling, negotiation
//! └──────────────┬───────────────┘
//!                │
//!        ┌───────┴────────┐
//!        ▼                ▼
//!   ┌────────┐       ┌────────┐
//!   │  V4L2  │       │  Fake  │
//!   └────────┘       └────────┘
//! ```

pub mod capturer;
pub mod enumeration;
pub mod fake;
pub mod v4l2_capturer;
pub mod v4l2_utils;

pub use capturer::CaptureFormats;
pub use enumeration::V4l2Enumerator;
pub use fake::{FakeScreenCapturerFactory, FakeVideoCapturer, FakeVideoDeviceCapturerFactory};
pub use v4l2_capturer::{V4l2Capturer, V4l2CapturerFactory};

use crate::backends::types::{Device, ScreencastId, VideoFormat};
use crate::errors::DeviceResult;

/// A source of video frames bound to one device, window or desktop
///
/// Implementors only expose their [`CaptureFormats`]; the negotiation
/// methods are provided on top of it.
pub trait VideoCapturer: Send {
    /// Platform id of what is being captured
    fn id(&self) -> &str;

    /// Whether frames come from a screen rather than a camera
    fn is_screencast(&self) -> bool;

    fn formats(&self) -> &CaptureFormats;

    fn formats_mut(&mut self) -> &mut CaptureFormats;

    /// Formats available for negotiation, with any ceiling applied
    fn supported_formats(&self) -> &[VideoFormat] {
        self.formats().supported()
    }

    /// Enforce the max-format ceiling, if one is set
    fn set_enable_camera_list(&mut self, enable: bool) {
        self.formats_mut().set_enable_camera_list(enable);
    }

    fn enable_camera_list(&self) -> bool {
        self.formats().enable_camera_list()
    }

    /// Set the max-format ceiling
    fn constrain_supported_formats(&mut self, max_format: VideoFormat) {
        self.formats_mut().constrain(max_format);
    }

    fn max_format(&self) -> Option<VideoFormat> {
        self.formats().max_format().copied()
    }

    /// The supported format closest to `desired`
    fn best_capture_format(&self, desired: &VideoFormat) -> Option<VideoFormat> {
        self.formats().best_format(desired)
    }
}

/// Builds capturers for enumerated video devices
pub trait VideoDeviceCapturerFactory: Send + Sync {
    fn create(&self, device: &Device) -> DeviceResult<Box<dyn VideoCapturer>>;
}

/// Builds capturers for windows and desktops
pub trait ScreenCapturerFactory: Send + Sync {
    fn create(&self, id: &ScreencastId) -> DeviceResult<Box<dyn VideoCapturer>>;
}
