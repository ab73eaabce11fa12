// SPDX-License-Identifier: GPL-3.0-only

//! Capture format negotiation
//!
//! Every capturer carries a [`CaptureFormats`] describing what it can
//! produce. The device manager may impose a ceiling on it; callers then ask
//! for the supported format closest to what they want.

use crate::backends::types::{FourCc, VideoFormat};
use tracing::debug;

/// Distance of a format that cannot satisfy the request at all
const MAX_DISTANCE: i64 = i64::MAX;

/// Weight applied to resolution shortfalls
///
/// Going down to 3/4 of the requested size costs as much as going up to
/// 1.5x, so smaller resolutions are strongly avoided without being ruled out.
const DOWN_PENALTY: i64 = -3;

/// Minimum acceptable fraction of the requested frame rate when the
/// resolution differs from the request
const MIN_FPS_RATIO_RESIZED: f32 = 28.0 / 30.0;

/// Minimum acceptable fraction of the requested frame rate when the
/// resolution matches the request
const MIN_FPS_RATIO_SAME_SIZE: f32 = 23.0 / 30.0;

/// Supported formats of a capturer plus the policy narrowing them
#[derive(Debug, Clone, Default)]
pub struct CaptureFormats {
    /// Everything the capturer reports
    all: Vec<VideoFormat>,
    /// `all` minus formats above the ceiling
    filtered: Vec<VideoFormat>,
    max_format: Option<VideoFormat>,
    enable_camera_list: bool,
    preferred_fourccs: Vec<FourCc>,
}

impl CaptureFormats {
    pub fn new(formats: Vec<VideoFormat>, preferred_fourccs: Vec<FourCc>) -> Self {
        let mut capture_formats = Self {
            all: formats,
            preferred_fourccs,
            ..Default::default()
        };
        capture_formats.update_filtered();
        capture_formats
    }

    /// Replace the formats reported by the capturer
    pub fn set_formats(&mut self, formats: Vec<VideoFormat>) {
        self.all = formats;
        self.update_filtered();
    }

    /// Formats available for negotiation (ceiling applied)
    pub fn supported(&self) -> &[VideoFormat] {
        &self.filtered
    }

    /// Every format the capturer reports, ignoring the ceiling
    pub fn all(&self) -> &[VideoFormat] {
        &self.all
    }

    pub fn max_format(&self) -> Option<&VideoFormat> {
        self.max_format.as_ref()
    }

    /// Whether the ceiling is enforced
    pub fn enable_camera_list(&self) -> bool {
        self.enable_camera_list
    }

    pub fn set_enable_camera_list(&mut self, enable: bool) {
        self.enable_camera_list = enable;
        self.update_filtered();
    }

    /// Set the ceiling; formats wider or taller are dropped while the camera
    /// list is enabled
    pub fn constrain(&mut self, max_format: VideoFormat) {
        self.max_format = Some(max_format);
        self.update_filtered();
    }

    /// Pixel formats in order of preference, used when a request accepts any
    pub fn preferred_fourccs(&self) -> &[FourCc] {
        &self.preferred_fourccs
    }

    fn exceeds_ceiling(&self, format: &VideoFormat) -> bool {
        if !self.enable_camera_list {
            return false;
        }
        self.max_format
            .is_some_and(|max| format.width > max.width || format.height > max.height)
    }

    fn update_filtered(&mut self) {
        let filtered: Vec<VideoFormat> = self
            .all
            .iter()
            .filter(|f| !self.exceeds_ceiling(f))
            .copied()
            .collect();

        // A ceiling below every format would leave nothing to capture with
        self.filtered = if filtered.is_empty() {
            self.all.clone()
        } else {
            filtered
        };
    }

    /// The supported format closest to `desired`, or `None` if no supported
    /// format has a compatible pixel format
    pub fn best_format(&self, desired: &VideoFormat) -> Option<VideoFormat> {
        let (best, distance) = self
            .filtered
            .iter()
            .map(|f| (f, format_distance(desired, f, &self.preferred_fourccs)))
            .min_by_key(|(_, distance)| *distance)?;

        if distance == MAX_DISTANCE {
            debug!(desired = %desired, "No supported format with a compatible pixel format");
            return None;
        }

        debug!(desired = %desired, best = %best, distance, "Selected capture format");
        Some(*best)
    }
}

/// How far `supported` is from `desired`; lower is better
///
/// Bit layout, most significant first: a heavy penalty when the frame rate
/// is well below the request (bit 62), width delta (from bit 28), height
/// delta against the requested aspect ratio (from bit 16), a light frame rate
/// penalty (bit 15), frame rate delta (from bit 8) and the pixel format's
/// preference rank.
pub fn format_distance(desired: &VideoFormat, supported: &VideoFormat, preferred: &[FourCc]) -> i64 {
    let supported_fourcc = supported.fourcc.canonical();
    let delta_fourcc = if desired.fourcc == FourCc::ANY {
        match preferred
            .iter()
            .position(|f| f.canonical() == supported_fourcc)
        {
            Some(rank) => rank as i64,
            None => return MAX_DISTANCE,
        }
    } else if supported_fourcc == desired.fourcc.canonical() {
        0
    } else {
        return MAX_DISTANCE;
    };

    let desired_width = desired.width as i64;
    let desired_height = desired.height as i64;
    let desired_fps = desired.framerate();
    let supported_fps = supported.framerate();

    let mut delta_w = supported.width as i64 - desired_width;
    let aspect_h = if desired_width != 0 {
        supported.width as i64 * desired_height / desired_width
    } else {
        desired_height
    };
    let mut delta_h = supported.height as i64 - aspect_h;
    let mut delta_fps = supported_fps - desired_fps;

    if delta_w < 0 {
        delta_w *= DOWN_PENALTY;
    }
    if delta_h < 0 {
        delta_h *= DOWN_PENALTY;
    }

    let mut distance = 0i64;
    if delta_fps < 0.0 {
        let min_desirable_fps = if delta_w != 0 {
            desired_fps * MIN_FPS_RATIO_RESIZED
        } else {
            desired_fps * MIN_FPS_RATIO_SAME_SIZE
        };
        delta_fps = -delta_fps;
        if supported_fps < min_desirable_fps {
            distance |= 1 << 62;
        } else {
            distance |= 1 << 15;
        }
    }

    let idelta_fps = delta_fps as i64;
    distance | (delta_w << 28) | (delta_h << 16) | (idelta_fps << 8) | delta_fourcc
}
