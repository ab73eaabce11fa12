// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device capturer
//!
//! Opens the node once to confirm it can capture and to read the formats it
//! advertises. Streaming is left to the consumer of the negotiated format.

use super::v4l2_utils::{enumerate_formats, query_device_info};
use super::{CaptureFormats, VideoCapturer, VideoDeviceCapturerFactory};
use crate::backends::types::{Device, FourCc};
use crate::errors::{DeviceError, DeviceResult};
use tracing::{debug, info};

/// Pixel formats in the order a V4L2 capturer prefers them
pub const V4L2_PREFERRED_FOURCCS: &[FourCc] = &[FourCc::I420, FourCc::YUY2, FourCc::UYVY, FourCc::MJPG];

/// Capturer bound to one `/dev/videoN` node
#[derive(Debug, Clone)]
pub struct V4l2Capturer {
    device_path: String,
    formats: CaptureFormats,
}

impl V4l2Capturer {
    pub fn open(device: &Device) -> DeviceResult<Self> {
        let info = query_device_info(&device.id)
            .ok_or_else(|| DeviceError::CaptureFailed(format!("cannot open {}", device.id)))?;
        if !info.can_capture {
            return Err(DeviceError::CaptureFailed(format!(
                "{} ({}) has no video capture capability",
                device.id, info.card
            )));
        }

        let formats = enumerate_formats(&device.id);
        info!(
            device = %device.name,
            path = %device.id,
            driver = %info.driver,
            card = %info.card,
            formats = formats.len(),
            "Opened V4L2 capturer"
        );

        Ok(Self {
            device_path: device.id.clone(),
            formats: CaptureFormats::new(formats, V4L2_PREFERRED_FOURCCS.to_vec()),
        })
    }
}

impl VideoCapturer for V4l2Capturer {
    fn id(&self) -> &str {
        &self.device_path
    }

    fn is_screencast(&self) -> bool {
        false
    }

    fn formats(&self) -> &CaptureFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CaptureFormats {
        &mut self.formats
    }
}

/// Production factory for camera capturers
#[derive(Debug, Clone, Copy, Default)]
pub struct V4l2CapturerFactory;

impl VideoDeviceCapturerFactory for V4l2CapturerFactory {
    fn create(&self, device: &Device) -> DeviceResult<Box<dyn VideoCapturer>> {
        debug!(device = %device, "Creating V4L2 capturer");
        Ok(Box::new(V4l2Capturer::open(device)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_fails() {
        let device = Device::new("Ghost", "/nonexistent/video0");
        let result = V4l2CapturerFactory.create(&device);
        assert!(matches!(result, Err(DeviceError::CaptureFailed(_))));
    }

    #[test]
    fn test_preferred_order_starts_uncompressed() {
        assert_eq!(V4L2_PREFERRED_FOURCCS.first(), Some(&FourCc::I420));
        assert_eq!(V4L2_PREFERRED_FOURCCS.last(), Some(&FourCc::MJPG));
    }
}
