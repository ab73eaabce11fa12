// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for device enumeration and capture
//!
//! This module provides platform-specific backend implementations for:
//! - Audio device enumeration via PipeWire
//! - Camera enumeration and capture via Video4Linux
//! - Window and desktop enumeration via X11
//!
//! # Architecture
//!
//! The device manager talks to each platform facility through a trait, so
//! every backend can be swapped for an in-memory fake in tests:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               DeviceManager                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────┐    ┌──────────────────┐   │
//! │  │    Audio    │    │     Camera       │   │
//! │  │  (PipeWire) │    │     (V4L2)       │   │
//! │  └─────────────┘    └──────────────────┘   │
//! │                     ┌──────────────────┐   │
//! │                     │     Screen       │   │
//! │                     │      (X11)       │   │
//! │                     └──────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`audio`]: Audio input and output enumeration
//! - [`camera`]: Camera enumeration, capturers and format negotiation
//! - [`screen`]: Window and desktop enumeration for screen capture
//! - [`fs`]: Filesystem queries used by name resolution
//! - [`types`]: Shared device and format types

pub mod audio;
pub mod camera;
pub mod fs;
pub mod screen;
pub mod types;

use crate::errors::DeviceResult;
use types::Device;

/// Source of audio input and output devices
pub trait AudioEnumerator: Send + Sync {
    /// Capture devices, in platform order
    fn audio_input_devices(&self) -> DeviceResult<Vec<Device>>;

    /// Playback devices, in platform order
    fn audio_output_devices(&self) -> DeviceResult<Vec<Device>>;
}

/// Source of video capture devices
pub trait VideoEnumerator: Send + Sync {
    /// Capture devices, in platform order
    fn video_capture_devices(&self) -> DeviceResult<Vec<Device>>;

    /// USB `vendor:product` id of a device, if it has one
    fn usb_id(&self, _device: &Device) -> Option<String> {
        None
    }
}

/// Audio enumerator returning fixed lists
#[derive(Debug, Clone, Default)]
pub struct FakeAudioEnumerator {
    pub inputs: Vec<Device>,
    pub outputs: Vec<Device>,
}

impl FakeAudioEnumerator {
    pub fn new(inputs: Vec<Device>, outputs: Vec<Device>) -> Self {
        Self { inputs, outputs }
    }
}

impl AudioEnumerator for FakeAudioEnumerator {
    fn audio_input_devices(&self) -> DeviceResult<Vec<Device>> {
        Ok(self.inputs.clone())
    }

    fn audio_output_devices(&self) -> DeviceResult<Vec<Device>> {
        Ok(self.outputs.clone())
    }
}

/// Video enumerator returning a fixed list
///
/// USB ids are looked up by device id in `usb_ids`.
#[derive(Debug, Clone, Default)]
pub struct FakeVideoEnumerator {
    pub devices: Vec<Device>,
    pub usb_ids: Vec<(String, String)>,
}

impl FakeVideoEnumerator {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            usb_ids: Vec::new(),
        }
    }

    /// Attach a USB id to the device with id `device_id`
    pub fn with_usb_id(mut self, device_id: impl Into<String>, usb_id: impl Into<String>) -> Self {
        self.usb_ids.push((device_id.into(), usb_id.into()));
        self
    }
}

impl VideoEnumerator for FakeVideoEnumerator {
    fn video_capture_devices(&self) -> DeviceResult<Vec<Device>> {
        Ok(self.devices.clone())
    }

    fn usb_id(&self, device: &Device) -> Option<String> {
        self.usb_ids
            .iter()
            .find(|(id, _)| *id == device.id)
            .map(|(_, usb_id)| usb_id.clone())
    }
}
