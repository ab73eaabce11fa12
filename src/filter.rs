// SPDX-License-Identifier: GPL-3.0-only

//! Exclusion filtering of device lists
//!
//! A device is dropped when its name contains any exclusion pattern as a
//! case-sensitive substring.

use crate::backends::types::Device;
use crate::errors::{DeviceError, DeviceResult};
use tracing::debug;

/// Whether `name` matches any of `patterns`
pub fn is_excluded<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| name.contains(p.as_ref()))
}

/// Remove excluded devices from `devices`, keeping the order of the rest
///
/// `None` and an empty pattern list leave the list untouched. An empty
/// pattern would match every device and is rejected without modifying the
/// list.
pub fn filter_devices<S: AsRef<str>>(devices: &mut Vec<Device>, exclusions: Option<&[S]>) -> DeviceResult<()> {
    let Some(patterns) = exclusions else {
        return Ok(());
    };

    if let Some(index) = patterns.iter().position(|p| p.as_ref().is_empty()) {
        return Err(DeviceError::InvalidPattern(format!("pattern {} is empty", index)));
    }

    devices.retain(|device| {
        let excluded = is_excluded(&device.name, patterns);
        if excluded {
            debug!(device = %device.name, "Excluding device");
        }
        !excluded
    });
    Ok(())
}
