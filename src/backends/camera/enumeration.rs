// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera enumeration and display name resolution
//!
//! Capture nodes are discovered through whichever metadata layout the
//! running kernel exposes, and each node is named by the first strategy in
//! an ordered list that produces a name:
//!
//! ```text
//! /sys/class/video4linux/ listable?  ──► sysfs "name" ─► sysfs "model" ─► /dev path
//! /proc/video/dev/ listable?         ──► proc "name:" field ───────────► /dev path
//! neither                            ──► scan /dev/video*, named by path
//! ```
//!
//! Nodes that fail the V4L2 liveness probe are dropped before naming.

use super::v4l2_utils::{HostV4l2Probe, V4l2Probe, usb_id_for_node};
use crate::backends::VideoEnumerator;
use crate::backends::fs::{FileSystem, HostFileSystem};
use crate::backends::types::Device;
use crate::constants::v4l2::{DEV_DIR, NODE_PREFIX, PROC_META_DIR, SYSFS_META_DIR, SYSFS_NAME_ATTRS};
use crate::errors::DeviceResult;
use tracing::{debug, info, warn};

/// Kernel metadata layout for Video4Linux devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLayout {
    /// `/sys/class/video4linux/<node>/{name,model}` (2.6 and later)
    Sysfs,
    /// `/proc/video/dev/<node>` key/value text (2.4)
    Proc,
    /// No metadata directory found
    Unknown,
}

impl MetadataLayout {
    /// Directory listing the device nodes for this layout
    pub fn metadata_dir(&self) -> Option<&'static str> {
        match self {
            MetadataLayout::Sysfs => Some(SYSFS_META_DIR),
            MetadataLayout::Proc => Some(PROC_META_DIR),
            MetadataLayout::Unknown => None,
        }
    }

    /// Naming strategies for this layout, tried in order
    pub fn strategies(&self) -> Vec<Box<dyn NameStrategy>> {
        let mut strategies: Vec<Box<dyn NameStrategy>> = match self {
            MetadataLayout::Sysfs => SYSFS_NAME_ATTRS
                .iter()
                .map(|attr| Box::new(SysfsAttribute { attr: *attr }) as Box<dyn NameStrategy>)
                .collect(),
            MetadataLayout::Proc => vec![Box::new(ProcVideoInfo)],
            MetadataLayout::Unknown => Vec::new(),
        };
        strategies.push(Box::new(DevicePath));
        strategies
    }
}

impl std::fmt::Display for MetadataLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataLayout::Sysfs => write!(f, "sysfs"),
            MetadataLayout::Proc => write!(f, "proc"),
            MetadataLayout::Unknown => write!(f, "unknown"),
        }
    }
}

/// One way of turning a device node name (e.g. `video0`) into a display name
pub trait NameStrategy: Send + Sync {
    /// Short label for logging
    fn label(&self) -> String;

    /// Display name, or `None` if this strategy has nothing to offer
    fn resolve(&self, fs: &dyn FileSystem, node: &str) -> Option<String>;
}

/// First line of a per-device sysfs attribute file
#[derive(Debug, Clone, Copy)]
pub struct SysfsAttribute {
    pub attr: &'static str,
}

impl NameStrategy for SysfsAttribute {
    fn label(&self) -> String {
        format!("sysfs {}", self.attr)
    }

    fn resolve(&self, fs: &dyn FileSystem, node: &str) -> Option<String> {
        let path = format!("{}{}/{}", SYSFS_META_DIR, node, self.attr);
        let contents = fs.read_to_string(&path)?;
        non_empty(contents.lines().next().unwrap_or_default())
    }
}

/// `name:` field of the 2.4 kernel proc file
#[derive(Debug, Clone, Copy)]
pub struct ProcVideoInfo;

impl NameStrategy for ProcVideoInfo {
    fn label(&self) -> String {
        "proc name".to_string()
    }

    fn resolve(&self, fs: &dyn FileSystem, node: &str) -> Option<String> {
        let contents = fs.read_to_string(&format!("{}{}", PROC_META_DIR, node))?;
        parse_proc_name(&contents)
    }
}

/// The device node path itself
#[derive(Debug, Clone, Copy)]
pub struct DevicePath;

impl NameStrategy for DevicePath {
    fn label(&self) -> String {
        "device path".to_string()
    }

    fn resolve(&self, _fs: &dyn FileSystem, node: &str) -> Option<String> {
        Some(format!("{}{}", DEV_DIR, node))
    }
}

/// Extract the `name` value from `key: value` lines
///
/// Keys and values are trimmed, so ` name:   Camera ` yields `Camera`.
pub fn parse_proc_name(contents: &str) -> Option<String> {
    contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "name")
        .and_then(|(_, value)| non_empty(value))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim_matches([' ', '\t', '\r', '\n']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sort key putting `video2` before `video10`
fn node_order(node: &str) -> (u32, String) {
    let number = node
        .strip_prefix(NODE_PREFIX)
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX);
    (number, node.to_string())
}

/// Video4Linux capture device enumerator
pub struct V4l2Enumerator {
    fs: Box<dyn FileSystem>,
    probe: Box<dyn V4l2Probe>,
}

impl V4l2Enumerator {
    pub fn new(fs: Box<dyn FileSystem>, probe: Box<dyn V4l2Probe>) -> Self {
        Self { fs, probe }
    }

    /// Enumerator over the real filesystem and device nodes
    pub fn host() -> Self {
        Self::new(Box::new(HostFileSystem), Box::new(HostV4l2Probe))
    }

    /// Guess the kernel metadata layout from which directory is listable
    pub fn detect_layout(&self) -> MetadataLayout {
        if self.fs.list_dir(SYSFS_META_DIR).is_some() {
            MetadataLayout::Sysfs
        } else if self.fs.list_dir(PROC_META_DIR).is_some() {
            MetadataLayout::Proc
        } else {
            MetadataLayout::Unknown
        }
    }

    /// Display name for a node under the given layout
    pub fn resolve_name(&self, layout: MetadataLayout, node: &str) -> String {
        for strategy in layout.strategies() {
            if let Some(name) = strategy.resolve(self.fs.as_ref(), node) {
                debug!(node, strategy = %strategy.label(), name = %name, "Resolved device name");
                return name;
            }
            debug!(node, strategy = %strategy.label(), "No name from strategy");
        }
        // DevicePath always resolves
        format!("{}{}", DEV_DIR, node)
    }

    /// Capture nodes listed in `dir` that pass the liveness probe, in node order
    fn live_nodes(&self, dir: &str) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .fs
            .list_dir(dir)
            .unwrap_or_default()
            .into_iter()
            .filter(|n| n.starts_with(NODE_PREFIX))
            .filter(|n| {
                let live = self.probe.is_v4l2_device(&format!("{}{}", DEV_DIR, n));
                if !live {
                    debug!(node = %n, "Skipping node that is not a V4L2 capture device");
                }
                live
            })
            .collect();
        nodes.sort_by_key(|n| node_order(n));
        nodes
    }

    /// Enumerate capture devices with resolved display names
    pub fn enumerate(&self) -> Vec<Device> {
        info!("Enumerating V4L2 devices");

        let layout = self.detect_layout();
        let mut devices = Vec::new();

        if let Some(dir) = layout.metadata_dir() {
            debug!(layout = %layout, dir, "V4L2 device metadata found");
            devices = self
                .live_nodes(dir)
                .into_iter()
                .map(|node| Device::new(self.resolve_name(layout, &node), format!("{}{}", DEV_DIR, node)))
                .collect();
        } else {
            warn!("Unable to detect V4L2 metadata directory");
        }

        if devices.is_empty() {
            debug!("Scanning {} for video devices", DEV_DIR);
            devices = self
                .live_nodes(DEV_DIR)
                .into_iter()
                .map(|node| {
                    let path = format!("{}{}", DEV_DIR, node);
                    Device::new(path.clone(), path)
                })
                .collect();
        }

        info!(count = devices.len(), "V4L2 enumeration complete");
        devices
    }
}

impl VideoEnumerator for V4l2Enumerator {
    fn video_capture_devices(&self) -> DeviceResult<Vec<Device>> {
        Ok(self.enumerate())
    }

    fn usb_id(&self, device: &Device) -> Option<String> {
        usb_id_for_node(self.fs.as_ref(), &device.id)
    }
}

impl std::fmt::Debug for V4l2Enumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Enumerator").finish_non_exhaustive()
    }
}
