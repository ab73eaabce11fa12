// SPDX-License-Identifier: GPL-3.0-only

//! Device change detection
//!
//! A [`DeviceSnapshot`] records the filtered device lists at one point in
//! time. Comparing two snapshots reports what was plugged in or removed.
//! Devices are compared by name and id together.

use crate::backends::types::Device;
use crate::errors::DeviceResult;
use crate::manager::{DeviceCategory, DeviceManager};
use std::collections::BTreeMap;
use tracing::debug;

/// Filtered device lists of every category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    devices: BTreeMap<DeviceCategory, Vec<Device>>,
}

impl DeviceSnapshot {
    /// Enumerate every category through `manager`
    pub fn capture(manager: &DeviceManager) -> DeviceResult<Self> {
        let mut devices = BTreeMap::new();
        for category in DeviceCategory::ALL {
            devices.insert(category, manager.devices(category)?);
        }
        Ok(Self { devices })
    }

    pub fn from_lists(lists: impl IntoIterator<Item = (DeviceCategory, Vec<Device>)>) -> Self {
        Self {
            devices: lists.into_iter().collect(),
        }
    }

    pub fn devices(&self, category: DeviceCategory) -> &[Device] {
        self.devices.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    /// What changed going from `previous` to `self`
    pub fn changes_since(&self, previous: &DeviceSnapshot) -> DeviceChanges {
        let mut changes = DeviceChanges::default();
        for category in DeviceCategory::ALL {
            let now = self.devices(category);
            let before = previous.devices(category);

            for device in now.iter().filter(|d| !before.contains(d)) {
                debug!(%category, device = %device, "Device added");
                changes.added.push((category, device.clone()));
            }
            for device in before.iter().filter(|d| !now.contains(d)) {
                debug!(%category, device = %device, "Device removed");
                changes.removed.push((category, device.clone()));
            }
        }
        changes
    }
}

/// Devices added and removed between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceChanges {
    pub added: Vec<(DeviceCategory, Device)>,
    pub removed: Vec<(DeviceCategory, Device)>,
}

impl DeviceChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn added_in(&self, category: DeviceCategory) -> impl Iterator<Item = &Device> {
        self.added.iter().filter(move |(c, _)| *c == category).map(|(_, d)| d)
    }

    pub fn removed_in(&self, category: DeviceCategory) -> impl Iterator<Item = &Device> {
        self.removed.iter().filter(move |(c, _)| *c == category).map(|(_, d)| d)
    }
}
