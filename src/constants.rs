// SPDX-License-Identifier: GPL-3.0-only

//! Library-wide constants

use std::time::Duration;

/// Name that resolves to the system default device of a category
pub const DEFAULT_DEVICE_NAME: &str = "";

/// Device id reserved for the system default device
pub const DEFAULT_DEVICE_ID: &str = "-1";

/// Max-format whitelist key matching every device without its own entry
pub const WILDCARD: &str = "*";

/// Video4Linux paths
pub mod v4l2 {
    /// Per-device metadata directory on 2.6+ kernels
    pub const SYSFS_META_DIR: &str = "/sys/class/video4linux/";

    /// Per-device metadata files on 2.4 kernels
    pub const PROC_META_DIR: &str = "/proc/video/dev/";

    /// Device node directory, scanned when no metadata layout is found
    pub const DEV_DIR: &str = "/dev/";

    /// Prefix of capture device node names
    pub const NODE_PREFIX: &str = "video";

    /// Sysfs attribute files tried in order for a display name
    pub const SYSFS_NAME_ATTRS: &[&str] = &["name", "model"];

    /// USB ancestor depth walked when looking for idVendor/idProduct
    pub const USB_ANCESTOR_DEPTH: usize = 5;
}

/// PipeWire audio enumeration
pub mod pipewire {
    /// Tool dumping the PipeWire object graph as JSON
    pub const PW_DUMP: &str = "pw-dump";

    /// Media class of capture (input) nodes
    pub const AUDIO_SOURCE_CLASS: &str = "Audio/Source";

    /// Media class of playback (output) nodes
    pub const AUDIO_SINK_CLASS: &str = "Audio/Sink";

    /// Metadata keys naming the default source, most specific first
    pub const DEFAULT_SOURCE_KEYS: &[&str] = &["default.audio.source", "default.configured.audio.source"];

    /// Metadata keys naming the default sink, most specific first
    pub const DEFAULT_SINK_KEYS: &[&str] = &["default.audio.sink", "default.configured.audio.sink"];
}

/// Built-in exclusion patterns applied when the config does not override them
pub mod exclusions {
    /// Virtual and broken capture devices that never produce usable video
    pub const VIDEO: &[&str] = &[
        "Google Camera Adapter",
        "Asus virtual Camera",
        "Bluetooth Video",
        "Sonix SN9C201p",
        "DVCPRO HD",
    ];

    pub const AUDIO_INPUT: &[&str] = &[];

    pub const AUDIO_OUTPUT: &[&str] = &[];
}

/// Screen capture constants
pub mod screen {
    /// Frame rate offered by screen capturers
    pub const SCREENCAST_FPS: u32 = 30;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Default poll interval of the device watcher
    pub const WATCH_INTERVAL: Duration = Duration::from_secs(2);
}
