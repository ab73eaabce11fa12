// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Per-category exclusion overrides and per-device max-format ceilings,
//! stored as JSON under the user config directory and applied to a
//! [`DeviceManager`] at startup.

use crate::backends::types::{FourCc, VideoFormat};
use crate::errors::{DeviceError, DeviceResult};
use crate::manager::{DeviceCategory, DeviceManager};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory under the user config dir holding the config file
pub const CONFIG_DIR_NAME: &str = "media-devices";

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Frame rate assumed for ceilings that do not name one
pub const DEFAULT_FRAMERATE: u32 = 30;

/// Format ceiling as written in the config file
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FormatSettings {
    /// Resolution width
    pub width: u32,
    /// Resolution height
    pub height: u32,
    /// Framerate
    #[serde(default)]
    pub framerate: Option<u32>,
    /// Pixel format (e.g., "YUYV", "MJPG", "I420"); empty accepts any
    #[serde(default)]
    pub pixel_format: String,
}

impl FormatSettings {
    pub fn to_video_format(&self) -> DeviceResult<VideoFormat> {
        let fourcc = if self.pixel_format.is_empty() {
            FourCc::ANY
        } else {
            FourCc::parse(&self.pixel_format).ok_or_else(|| {
                DeviceError::InvalidFormat(format!("unknown pixel format '{}'", self.pixel_format))
            })?
        };

        let format = VideoFormat::with_fps(
            self.width,
            self.height,
            self.framerate.unwrap_or(DEFAULT_FRAMERATE),
            fourcc,
        );
        if format.is_valid() {
            Ok(format)
        } else {
            Err(DeviceError::InvalidFormat(format.to_string()))
        }
    }
}

impl From<&VideoFormat> for FormatSettings {
    fn from(format: &VideoFormat) -> Self {
        Self {
            width: format.width,
            height: format.height,
            framerate: Some(format.framerate().round() as u32),
            pixel_format: if format.fourcc == FourCc::ANY {
                String::new()
            } else {
                String::from_utf8_lossy(&format.fourcc.bytes()).to_string()
            },
        }
    }
}

/// Persistent device policy
///
/// Exclusion lists left unset keep the built-in patterns; an empty list
/// disables filtering for that category.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audio input name patterns to hide
    pub audio_input_exclusions: Option<Vec<String>>,
    /// Audio output name patterns to hide
    pub audio_output_exclusions: Option<Vec<String>>,
    /// Camera name patterns to hide
    pub video_exclusions: Option<Vec<String>>,
    /// Format ceilings (key = camera name, USB id "vvvv:pppp" or "*")
    pub max_formats: HashMap<String, FormatSettings>,
}

impl Config {
    /// `<config dir>/media-devices/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default path, falling back to defaults when absent
    pub fn load() -> DeviceResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> DeviceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> DeviceResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn exclusions(&self, category: DeviceCategory) -> Option<&Vec<String>> {
        match category {
            DeviceCategory::AudioInput => self.audio_input_exclusions.as_ref(),
            DeviceCategory::AudioOutput => self.audio_output_exclusions.as_ref(),
            DeviceCategory::VideoCapture => self.video_exclusions.as_ref(),
        }
    }

    /// Push exclusions and ceilings into a manager
    ///
    /// Ceilings that fail to parse are skipped with a warning.
    pub fn apply(&self, manager: &mut DeviceManager) {
        for category in DeviceCategory::ALL {
            if let Some(patterns) = self.exclusions(category) {
                debug!(%category, count = patterns.len(), "Applying configured exclusions");
                manager.set_exclusions(category, Some(patterns.clone()));
            }
        }

        for (key, settings) in &self.max_formats {
            let applied = settings
                .to_video_format()
                .and_then(|format| manager.set_video_capture_device_max_format(key, format));
            if let Err(e) = applied {
                warn!(key = %key, error = %e, "Skipping configured max format");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_settings_defaults() {
        let settings: FormatSettings = serde_json::from_str(r#"{ "width": 640, "height": 480 }"#).unwrap();
        let format = settings.to_video_format().unwrap();
        assert_eq!(format, VideoFormat::with_fps(640, 480, DEFAULT_FRAMERATE, FourCc::ANY));
    }

    #[test]
    fn test_format_settings_rejects_unknown_fourcc() {
        let settings = FormatSettings {
            width: 640,
            height: 480,
            framerate: Some(30),
            pixel_format: "TOOLONG".to_string(),
        };
        assert!(matches!(settings.to_video_format(), Err(DeviceError::InvalidFormat(_))));
    }

    #[test]
    fn test_format_settings_from_video_format() {
        let format = VideoFormat::with_fps(1280, 720, 30, FourCc::MJPG);
        let settings = FormatSettings::from(&format);
        assert_eq!(settings.pixel_format, "MJPG");
        assert_eq!(settings.framerate, Some(30));
        assert_eq!(settings.to_video_format().unwrap(), format);
    }

    #[test]
    fn test_exclusions_by_category() {
        let config = Config {
            video_exclusions: Some(vec!["Virtual".to_string()]),
            ..Default::default()
        };
        assert_eq!(config.exclusions(DeviceCategory::VideoCapture).map(Vec::len), Some(1));
        assert!(config.exclusions(DeviceCategory::AudioInput).is_none());
    }
}
