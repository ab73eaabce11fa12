// SPDX-License-Identifier: MPL-2.0

//! Audio device enumeration for PipeWire
//!
//! Devices are read from the JSON object graph printed by `pw-dump`. Capture
//! nodes (`Audio/Source`) are inputs and playback nodes (`Audio/Sink`) are
//! outputs. The node the session manager marks as default sorts first.

use super::AudioEnumerator;
use super::types::Device;
use crate::constants::pipewire::{
    AUDIO_SINK_CLASS, AUDIO_SOURCE_CLASS, DEFAULT_SINK_KEYS, DEFAULT_SOURCE_KEYS, PW_DUMP,
};
use crate::errors::{DeviceError, DeviceResult};
use serde_json::Value;
use std::process::Command;
use tracing::{debug, warn};

/// Audio enumerator backed by `pw-dump`
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeWireAudioEnumerator;

impl PipeWireAudioEnumerator {
    /// Run `pw-dump` and return its stdout
    ///
    /// A missing tool or failed run means there is no PipeWire to ask, which
    /// is reported as "no devices" rather than as an error.
    fn dump(&self) -> Option<String> {
        let output = match Command::new(PW_DUMP).output() {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run {}: {}", PW_DUMP, e);
                return None;
            }
        };

        if !output.status.success() {
            warn!("{} command failed", PW_DUMP);
            return None;
        }

        match String::from_utf8(output.stdout) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Failed to parse {} output: {}", PW_DUMP, e);
                None
            }
        }
    }

    fn devices(&self, media_class: &str, default_keys: &[&str]) -> DeviceResult<Vec<Device>> {
        match self.dump() {
            Some(json) => parse_pw_dump(&json, media_class, default_keys),
            None => Ok(Vec::new()),
        }
    }
}

impl AudioEnumerator for PipeWireAudioEnumerator {
    fn audio_input_devices(&self) -> DeviceResult<Vec<Device>> {
        self.devices(AUDIO_SOURCE_CLASS, DEFAULT_SOURCE_KEYS)
    }

    fn audio_output_devices(&self) -> DeviceResult<Vec<Device>> {
        self.devices(AUDIO_SINK_CLASS, DEFAULT_SINK_KEYS)
    }
}

/// Node name of the default device, from the "default" metadata object
fn default_node_name(objects: &[Value], default_keys: &[&str]) -> Option<String> {
    let metadata = objects.iter().find(|obj| {
        obj.get("type").and_then(Value::as_str) == Some("PipeWire:Interface:Metadata")
            && obj.pointer("/props/metadata.name").and_then(Value::as_str) == Some("default")
    })?;
    let entries = metadata.get("metadata")?.as_array()?;

    for key in default_keys {
        let name = entries
            .iter()
            .filter(|e| e.get("key").and_then(Value::as_str) == Some(*key))
            .find_map(|e| e.pointer("/value/name").and_then(Value::as_str));
        if let Some(name) = name {
            debug!(key, default = %name, "Found default audio node from metadata");
            return Some(name.to_string());
        }
    }
    None
}

/// Extract devices of one media class from `pw-dump` JSON
///
/// Names come from `node.nick`, then `node.description`, then `node.name`;
/// the id is `node.name`. The default node sorts first and the rest
/// alphabetically by name.
pub fn parse_pw_dump(json: &str, media_class: &str, default_keys: &[&str]) -> DeviceResult<Vec<Device>> {
    let objects: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| DeviceError::Enumeration(format!("invalid {} output: {}", PW_DUMP, e)))?;

    let default_node = default_node_name(&objects, default_keys);

    let mut devices: Vec<(bool, Device)> = objects
        .iter()
        .filter_map(|obj| obj.pointer("/info/props"))
        .filter(|props| props.get("media.class").and_then(Value::as_str) == Some(media_class))
        .filter_map(|props| {
            let node_name = props.get("node.name").and_then(Value::as_str)?;
            let name = ["node.nick", "node.description", "node.name"]
                .iter()
                .find_map(|key| props.get(*key).and_then(Value::as_str))
                .unwrap_or(node_name);
            let is_default = default_node.as_deref() == Some(node_name);

            debug!(name, node_name, is_default, media_class, "Found audio device");
            Some((is_default, Device::new(name, node_name)))
        })
        .collect();

    devices.sort_by(|(a_default, a), (b_default, b)| {
        b_default.cmp(a_default).then_with(|| a.name.cmp(&b.name))
    });

    Ok(devices.into_iter().map(|(_, device)| device).collect())
}
