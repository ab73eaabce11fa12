// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use media_devices::constants::{exclusions, screen, timing, v4l2};
use media_devices::{DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, DeviceCategory, WILDCARD};

#[test]
fn test_default_device_sentinels() {
    // The default name is empty and its id can never be a real device path
    assert_eq!(DEFAULT_DEVICE_NAME, "");
    assert_eq!(DEFAULT_DEVICE_ID, "-1");
    assert_eq!(WILDCARD, "*");
}

#[test]
fn test_builtin_exclusions_by_category() {
    assert_eq!(DeviceCategory::VideoCapture.builtin_exclusions(), exclusions::VIDEO);
    assert!(exclusions::VIDEO.contains(&"Google Camera Adapter"));
    assert!(DeviceCategory::AudioInput.builtin_exclusions().is_empty());
}

#[test]
fn test_v4l2_paths_are_directories() {
    // Paths are joined with node names by concatenation
    for dir in [v4l2::SYSFS_META_DIR, v4l2::PROC_META_DIR, v4l2::DEV_DIR] {
        assert!(dir.ends_with('/'), "{} should end with a slash", dir);
    }
}

#[test]
fn test_timing_values() {
    assert!(screen::SCREENCAST_FPS > 0);
    assert!(!timing::WATCH_INTERVAL.is_zero());
}
