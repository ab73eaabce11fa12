// SPDX-License-Identifier: GPL-3.0-only

//! Shared V4L2 utility functions
//!
//! Capability probing uses a raw `VIDIOC_QUERYCAP` ioctl so that nodes can
//! be checked without the overhead of a full device handle. Format
//! enumeration goes through the `v4l` crate. The sysfs walk at the bottom
//! finds a node's USB vendor/product.

use crate::backends::fs::FileSystem;
use crate::backends::types::{FourCc, VideoFormat};
use crate::constants::v4l2::{SYSFS_META_DIR, USB_ANCESTOR_DEPTH};
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::debug;
use v4l::framesize::FrameSizeEnum;
use v4l::frameinterval::FrameIntervalEnum;
use v4l::prelude::*;
use v4l::video::Capture;

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 3=READ|WRITE

/// Query device capabilities (v4l2_capability: 104 bytes)
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
const V4L2_CAP_VIDEO_CAPTURE_MPLANE: u32 = 0x0000_1000;
const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

/// Character device major number of Video4Linux nodes
const V4L2_MAJOR: u64 = 81;

/// Resolutions offered for stepwise/continuous frame size ranges
const STEPWISE_RESOLUTIONS: &[(u32, u32)] = &[(1920, 1080), (1280, 720), (640, 480), (320, 240)];

/// Frame rate assumed when a device does not report intervals
const FALLBACK_FPS: u32 = 30;

// ===== V4L2 ioctl Structures =====

/// V4L2 capability structure for VIDIOC_QUERYCAP ioctl
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

/// Capability summary of an open V4L2 node
#[derive(Debug, Clone, Default)]
pub struct V4l2DeviceInfo {
    pub driver: String,
    pub card: String,
    pub bus_info: String,
    /// Node can capture video (single- or multi-planar)
    pub can_capture: bool,
}

/// Liveness check deciding whether a path is a usable V4L2 capture node
pub trait V4l2Probe: Send + Sync {
    fn is_v4l2_device(&self, device_path: &str) -> bool;
}

/// Probes real device nodes with VIDIOC_QUERYCAP
#[derive(Debug, Clone, Copy, Default)]
pub struct HostV4l2Probe;

impl V4l2Probe for HostV4l2Probe {
    fn is_v4l2_device(&self, device_path: &str) -> bool {
        let Ok(meta) = std::fs::metadata(device_path) else {
            return false;
        };
        if !meta.file_type().is_char_device() || dev_major(meta.rdev()) != V4L2_MAJOR {
            debug!(device_path, "Not a V4L2 character device");
            return false;
        }

        match query_device_info(device_path) {
            Some(info) if info.can_capture => true,
            Some(info) => {
                debug!(device_path, driver = %info.driver, "V4L2 node without video capture");
                false
            }
            None => false,
        }
    }
}

/// Accepts exactly the listed device paths
#[derive(Debug, Clone, Default)]
pub struct FakeV4l2Probe {
    devices: Vec<String>,
}

impl FakeV4l2Probe {
    pub fn new<S: Into<String>>(devices: impl IntoIterator<Item = S>) -> Self {
        Self {
            devices: devices.into_iter().map(Into::into).collect(),
        }
    }
}

impl V4l2Probe for FakeV4l2Probe {
    fn is_v4l2_device(&self, device_path: &str) -> bool {
        self.devices.iter().any(|d| d == device_path)
    }
}

fn dev_major(rdev: u64) -> u64 {
    ((rdev >> 8) & 0xfff) | ((rdev >> 32) & !0xfff)
}

fn open_nonblocking(device_path: &str) -> Option<std::fs::File> {
    std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(device_path)
        .ok()
}

fn c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).to_string()
}

/// Query V4L2 capabilities for an open file descriptor.
///
/// Issues the `VIDIOC_QUERYCAP` ioctl and returns the capability struct,
/// or `None` if the ioctl fails.
fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

/// Open a node and summarize its capabilities
pub fn query_device_info(device_path: &str) -> Option<V4l2DeviceInfo> {
    let file = open_nonblocking(device_path)?;
    let cap = query_v4l2_cap(file.as_raw_fd())?;

    // device_caps describes this node; capabilities covers the whole device
    let caps = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    let info = V4l2DeviceInfo {
        driver: c_string(&cap.driver),
        card: c_string(&cap.card),
        bus_info: c_string(&cap.bus_info),
        can_capture: caps & (V4L2_CAP_VIDEO_CAPTURE | V4L2_CAP_VIDEO_CAPTURE_MPLANE) != 0,
    };
    debug!(device_path, driver = %info.driver, card = %info.card, "Queried V4L2 capabilities");
    Some(info)
}

/// Enumerate every capture format a node advertises
///
/// Discrete frame sizes are expanded with each of their discrete intervals.
/// Stepwise and continuous ranges contribute the common resolutions that fall
/// inside them at their fastest interval.
pub fn enumerate_formats(device_path: &str) -> Vec<VideoFormat> {
    let dev = match Device::with_path(device_path) {
        Ok(d) => d,
        Err(e) => {
            debug!(device_path, error = %e, "Failed to open V4L2 device");
            return Vec::new();
        }
    };

    let mut formats = Vec::new();

    // Query supported formats
    if let Ok(format_iter) = dev.enum_formats() {
        for fmt_desc in format_iter {
            let fourcc = FourCc::new(&fmt_desc.fourcc.repr);
            let Ok(frame_sizes) = dev.enum_framesizes(fmt_desc.fourcc) else {
                continue;
            };

            for size in frame_sizes {
                for (width, height) in frame_size_resolutions(&size.size) {
                    let intervals: Vec<Duration> = dev
                        .enum_frameintervals(fmt_desc.fourcc, width, height)
                        .map(|intervals| {
                            intervals
                                .iter()
                                .filter_map(|i| frame_interval_duration(&i.interval))
                                .collect()
                        })
                        .unwrap_or_default();

                    if intervals.is_empty() {
                        formats.push(VideoFormat::with_fps(width, height, FALLBACK_FPS, fourcc));
                    } else {
                        formats.extend(
                            intervals
                                .into_iter()
                                .map(|interval| VideoFormat::new(width, height, interval, fourcc)),
                        );
                    }
                }
            }
        }
    }

    debug!(device_path, count = formats.len(), "Enumerated V4L2 formats");
    formats
}

/// Resolutions offered by one frame size entry
fn frame_size_resolutions(size: &FrameSizeEnum) -> Vec<(u32, u32)> {
    match size {
        FrameSizeEnum::Discrete(discrete) => vec![(discrete.width, discrete.height)],
        FrameSizeEnum::Stepwise(step) => STEPWISE_RESOLUTIONS
            .iter()
            .copied()
            .filter(|&(w, h)| {
                (step.min_width..=step.max_width).contains(&w) && (step.min_height..=step.max_height).contains(&h)
            })
            .collect(),
    }
}

/// Frame interval of one interval entry; stepwise ranges give their minimum
fn frame_interval_duration(interval: &FrameIntervalEnum) -> Option<Duration> {
    let frac = match interval {
        FrameIntervalEnum::Discrete(frac) => frac,
        FrameIntervalEnum::Stepwise(step) => &step.min,
    };
    if frac.numerator == 0 || frac.denominator == 0 {
        return None;
    }
    Some(Duration::from_nanos(
        frac.numerator as u64 * 1_000_000_000 / frac.denominator as u64,
    ))
}

/// USB `vendor:product` id of a V4L2 node, read from sysfs
///
/// Resolves `/sys/class/video4linux/<node>/device` and walks up the device
/// hierarchy until a directory with `idVendor` and `idProduct` is found.
pub fn usb_id_for_node(fs: &dyn FileSystem, device_path: &str) -> Option<String> {
    let node = device_path.rsplit('/').next().filter(|n| !n.is_empty())?;
    let resolved = fs.canonicalize(&format!("{}{}/device", SYSFS_META_DIR, node))?;

    let mut path = std::path::PathBuf::from(resolved);
    for _ in 0..USB_ANCESTOR_DEPTH {
        let dir = path.to_string_lossy().to_string();
        if let (Some(vendor), Some(product)) = (
            fs.read_to_string(&format!("{}/idVendor", dir)),
            fs.read_to_string(&format!("{}/idProduct", dir)),
        ) {
            let usb_id = format!("{}:{}", vendor.trim(), product.trim()).to_lowercase();
            debug!(device_path, usb_id = %usb_id, "Found USB id");
            return Some(usb_id);
        }
        if !path.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::fs::FakeFileSystem;

    #[test]
    fn test_fake_probe_accepts_listed_paths_only() {
        let probe = FakeV4l2Probe::new(["/dev/video0"]);
        assert!(probe.is_v4l2_device("/dev/video0"));
        assert!(!probe.is_v4l2_device("/dev/video1"));
    }

    #[test]
    fn test_host_probe_rejects_regular_files() {
        assert!(!HostV4l2Probe.is_v4l2_device("/dev/null"));
        assert!(!HostV4l2Probe.is_v4l2_device("/nonexistent/video0"));
    }

    #[test]
    fn test_dev_major() {
        // makedev(81, 3) with the glibc encoding
        let rdev = (81u64 << 8) | 3;
        assert_eq!(dev_major(rdev), 81);
    }

    #[test]
    fn test_frame_size_resolutions() {
        let discrete = FrameSizeEnum::Discrete(v4l::framesize::Discrete {
            width: 1280,
            height: 720,
        });
        assert_eq!(frame_size_resolutions(&discrete), vec![(1280, 720)]);

        let stepwise = FrameSizeEnum::Stepwise(v4l::framesize::Stepwise {
            min_width: 320,
            max_width: 1280,
            step_width: 16,
            min_height: 240,
            max_height: 720,
            step_height: 16,
        });
        assert_eq!(
            frame_size_resolutions(&stepwise),
            vec![(1280, 720), (640, 480), (320, 240)]
        );
    }

    #[test]
    fn test_frame_interval_duration() {
        let thirty = FrameIntervalEnum::Discrete(v4l::Fraction::new(1, 30));
        assert_eq!(frame_interval_duration(&thirty), Some(Duration::from_nanos(33_333_333)));

        let stepwise = FrameIntervalEnum::Stepwise(v4l::frameinterval::Stepwise {
            min: v4l::Fraction::new(1, 60),
            max: v4l::Fraction::new(1, 5),
            step: v4l::Fraction::new(1, 1),
        });
        assert_eq!(frame_interval_duration(&stepwise), Some(Duration::from_nanos(16_666_666)));

        let broken = FrameIntervalEnum::Discrete(v4l::Fraction::new(0, 30));
        assert_eq!(frame_interval_duration(&broken), None);
    }

    #[test]
    fn test_usb_id_found_in_ancestor() {
        let fs = FakeFileSystem::new([
            ("/sys/class/video4linux/video0/device/interface", "UVC Camera"),
            ("/sys/class/video4linux/video0/idVendor", "046D\n"),
            ("/sys/class/video4linux/video0/idProduct", "0825\n"),
        ]);
        assert_eq!(
            usb_id_for_node(&fs, "/dev/video0").as_deref(),
            Some("046d:0825")
        );
    }

    #[test]
    fn test_usb_id_absent() {
        let fs = FakeFileSystem::new([("/sys/class/video4linux/video0/name", "Camera")]);
        assert!(usb_id_for_node(&fs, "/dev/video0").is_none());
        assert!(usb_id_for_node(&fs, "/dev/").is_none());
    }
}
