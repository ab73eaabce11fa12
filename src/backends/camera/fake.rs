// SPDX-License-Identifier: GPL-3.0-only

//! In-memory capturers for tests and headless use

use super::{CaptureFormats, ScreenCapturerFactory, VideoCapturer, VideoDeviceCapturerFactory};
use crate::backends::types::{Device, FourCc, ScreencastId, VideoFormat};
use crate::errors::DeviceResult;

/// Capturer with a fixed set of I420 formats
///
/// Offers 1280x720, 640x480, 320x240 and 160x120 at 30 fps plus 1280x720
/// at 60 fps.
#[derive(Debug, Clone)]
pub struct FakeVideoCapturer {
    id: String,
    screencast: bool,
    formats: CaptureFormats,
}

impl FakeVideoCapturer {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_formats(id, Self::default_formats())
    }

    pub fn with_formats(id: impl Into<String>, formats: Vec<VideoFormat>) -> Self {
        Self {
            id: id.into(),
            screencast: false,
            formats: CaptureFormats::new(formats, vec![FourCc::I420, FourCc::MJPG]),
        }
    }

    /// Mark the capturer as capturing a screen
    pub fn screencast(mut self) -> Self {
        self.screencast = true;
        self
    }

    pub fn default_formats() -> Vec<VideoFormat> {
        vec![
            VideoFormat::with_fps(1280, 720, 30, FourCc::I420),
            VideoFormat::with_fps(640, 480, 30, FourCc::I420),
            VideoFormat::with_fps(320, 240, 30, FourCc::I420),
            VideoFormat::with_fps(160, 120, 30, FourCc::I420),
            VideoFormat::with_fps(1280, 720, 60, FourCc::I420),
        ]
    }
}

impl VideoCapturer for FakeVideoCapturer {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_screencast(&self) -> bool {
        self.screencast
    }

    fn formats(&self) -> &CaptureFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CaptureFormats {
        &mut self.formats
    }
}

/// Device factory producing [`FakeVideoCapturer`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeVideoDeviceCapturerFactory;

impl VideoDeviceCapturerFactory for FakeVideoDeviceCapturerFactory {
    fn create(&self, device: &Device) -> DeviceResult<Box<dyn VideoCapturer>> {
        Ok(Box::new(FakeVideoCapturer::new(device.id.clone())))
    }
}

/// Screen factory producing screencast [`FakeVideoCapturer`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeScreenCapturerFactory;

impl ScreenCapturerFactory for FakeScreenCapturerFactory {
    fn create(&self, id: &ScreencastId) -> DeviceResult<Box<dyn VideoCapturer>> {
        Ok(Box::new(FakeVideoCapturer::new(id.to_string()).screencast()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::types::WindowId;

    #[test]
    fn test_device_factory_binds_id() {
        let capturer = FakeVideoDeviceCapturerFactory
            .create(&Device::new("Cam", "/dev/video0"))
            .unwrap();
        assert_eq!(capturer.id(), "/dev/video0");
        assert!(!capturer.is_screencast());
        assert_eq!(capturer.supported_formats().len(), 5);
    }

    #[test]
    fn test_screen_factory_marks_screencast() {
        let capturer = FakeScreenCapturerFactory
            .create(&ScreencastId::Window(WindowId(0x1a)))
            .unwrap();
        assert!(capturer.is_screencast());
        assert_eq!(capturer.id(), "window:0x1a");
    }
}
