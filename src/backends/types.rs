// SPDX-License-Identifier: GPL-3.0-only
// Shared types for device enumeration and capture negotiation

//! Shared types for device backends

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::DEFAULT_DEVICE_ID;

/// One physical or logical media endpoint
///
/// `name` is what users see and what exclusion and whitelist policy match
/// against. It is not guaranteed to be unique or stable across refreshes.
/// `id` is the opaque platform identifier used to bind a capturer to the
/// endpoint (a `/dev/videoN` path for V4L2, a node name for PipeWire).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub id: String,
}

impl Device {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Whether this device stands for the system default endpoint
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_DEVICE_ID
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// FourCC pixel format tag
///
/// Stored little-endian the way V4L2 and most capture APIs pack it, so
/// `FourCc::new(b"YUYV")` equals the `pixelformat` field reported by the
/// kernel for that format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FourCc(pub u32);

impl FourCc {
    /// Matches any pixel format during negotiation
    pub const ANY: FourCc = FourCc(0xFFFF_FFFF);

    /// Planar YUV 4:2:0
    pub const I420: FourCc = FourCc::new(b"I420");
    pub const YV12: FourCc = FourCc::new(b"YV12");
    pub const NV12: FourCc = FourCc::new(b"NV12");
    pub const NV21: FourCc = FourCc::new(b"NV21");
    /// Packed YUV 4:2:2 (Y0 U Y1 V)
    pub const YUY2: FourCc = FourCc::new(b"YUY2");
    /// Packed YUV 4:2:2 (U Y0 V Y1)
    pub const UYVY: FourCc = FourCc::new(b"UYVY");
    pub const MJPG: FourCc = FourCc::new(b"MJPG");
    pub const H264: FourCc = FourCc::new(b"H264");
    pub const ARGB: FourCc = FourCc::new(b"ARGB");
    pub const BGRA: FourCc = FourCc::new(b"BGRA");
    /// 24-bit RGB, 3 bytes per pixel
    pub const RGB24: FourCc = FourCc::new(b"RAW ");

    // Aliases folded by `canonical`
    const IYUV: FourCc = FourCc::new(b"IYUV");
    const YU12: FourCc = FourCc::new(b"YU12");
    const YUYV: FourCc = FourCc::new(b"YUYV");
    const YUVS: FourCc = FourCc::new(b"yuvs");
    const HDYC: FourCc = FourCc::new(b"HDYC");
    const TWO_VUY: FourCc = FourCc::new(b"2vuy");
    const JPEG: FourCc = FourCc::new(b"JPEG");
    const DMB1: FourCc = FourCc::new(b"dmb1");
    const BGR3: FourCc = FourCc::new(b"BGR3");
    const CM32: FourCc = FourCc(0x2000_0000);

    pub const fn new(code: &[u8; 4]) -> Self {
        FourCc(
            (code[0] as u32)
                | ((code[1] as u32) << 8)
                | ((code[2] as u32) << 16)
                | ((code[3] as u32) << 24),
        )
    }

    /// Parse a four character string such as `"YUYV"`
    pub fn parse(code: &str) -> Option<Self> {
        let bytes: [u8; 4] = code.as_bytes().try_into().ok()?;
        Some(Self::new(&bytes))
    }

    /// Fold platform aliases onto one tag so equal formats compare equal
    pub fn canonical(self) -> Self {
        match self {
            Self::IYUV | Self::YU12 => Self::I420,
            Self::YUYV | Self::YUVS => Self::YUY2,
            Self::HDYC | Self::TWO_VUY => Self::UYVY,
            Self::JPEG | Self::DMB1 => Self::MJPG,
            Self::BGR3 => Self::RGB24,
            Self::CM32 => Self::BGRA,
            other => other,
        }
    }

    pub fn bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::ANY {
            return write!(f, "ANY");
        }
        let bytes = self.bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            write!(f, "{}", String::from_utf8_lossy(&bytes).trim_end())
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

impl std::fmt::Debug for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FourCc({})", self)
    }
}

/// Capture format: resolution, frame interval and pixel format
///
/// The frame rate is stored as an interval so rates like 29.97 fps round-trip
/// without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub interval: Duration,
    pub fourcc: FourCc,
}

impl VideoFormat {
    pub fn new(width: u32, height: u32, interval: Duration, fourcc: FourCc) -> Self {
        Self {
            width,
            height,
            interval,
            fourcc,
        }
    }

    /// Create a format from an integer frame rate
    pub fn with_fps(width: u32, height: u32, fps: u32, fourcc: FourCc) -> Self {
        Self::new(width, height, Self::fps_to_interval(fps), fourcc)
    }

    /// Convert a frame rate to a frame interval; zero maps to a zero interval
    pub fn fps_to_interval(fps: u32) -> Duration {
        if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(1_000_000_000 / fps as u64)
        }
    }

    /// Convert a frame interval to a frame rate; a zero interval maps to 0
    pub fn interval_to_fps(interval: Duration) -> f32 {
        let nanos = interval.as_nanos();
        if nanos == 0 {
            0.0
        } else {
            (1_000_000_000f64 / nanos as f64) as f32
        }
    }

    /// Frame rate in frames per second
    pub fn framerate(&self) -> f32 {
        Self::interval_to_fps(self.interval)
    }

    /// Width, height and interval are all non-zero
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.interval.is_zero()
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fps = self.framerate();
        if fps.fract().abs() < 0.01 {
            write!(f, "{}x{}@{:.0} {}", self.width, self.height, fps, self.fourcc)
        } else {
            write!(f, "{}x{}@{:.2} {}", self.width, self.height, fps, self.fourcc)
        }
    }
}

/// Opaque platform window identifier (an X11 window id on Linux)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// Opaque platform desktop identifier (an EWMH desktop index on Linux)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesktopId(pub u64);

/// Target of a screen capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreencastId {
    Window(WindowId),
    Desktop(DesktopId),
}

impl From<WindowId> for ScreencastId {
    fn from(id: WindowId) -> Self {
        ScreencastId::Window(id)
    }
}

impl From<DesktopId> for ScreencastId {
    fn from(id: DesktopId) -> Self {
        ScreencastId::Desktop(id)
    }
}

impl std::fmt::Display for ScreencastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreencastId::Window(id) => write!(f, "window:{:#x}", id.0),
            ScreencastId::Desktop(id) => write!(f, "desktop:{}", id.0),
        }
    }
}

/// A top-level window that can be captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDescription {
    pub id: WindowId,
    pub title: String,
}

/// A desktop (virtual workspace) that can be captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopDescription {
    pub id: DesktopId,
    pub title: String,
    /// The desktop currently shown
    pub primary: bool,
}
