// SPDX-License-Identifier: GPL-3.0-only

//! Device manager
//!
//! The manager provides:
//! - Platform subsystem lifecycle (`init` / `terminate`)
//! - Filtered enumeration of audio inputs, audio outputs and cameras
//! - Lookup by display name, with the empty name meaning "default"
//! - Capturer creation with per-device max-format ceilings
//! - Window and desktop listing for screen capture

use crate::backends::audio::PipeWireAudioEnumerator;
use crate::backends::camera::{
    ScreenCapturerFactory, V4l2CapturerFactory, V4l2Enumerator, VideoCapturer, VideoDeviceCapturerFactory,
};
use crate::backends::screen::{WindowPicker, X11ScreenCapturerFactory, host_window_picker};
use crate::backends::types::{DesktopDescription, Device, ScreencastId, VideoFormat, WindowDescription};
use crate::backends::{AudioEnumerator, VideoEnumerator};
use crate::config::Config;
use crate::constants::{DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, WILDCARD, exclusions};
use crate::errors::{DeviceError, DeviceResult};
use crate::filter::filter_devices;
use crate::subsystem::{HostSubsystem, PlatformSubsystem, SubsystemRef};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Kind of enumerable device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceCategory {
    AudioInput,
    AudioOutput,
    VideoCapture,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 3] = [
        DeviceCategory::AudioInput,
        DeviceCategory::AudioOutput,
        DeviceCategory::VideoCapture,
    ];

    /// Exclusion patterns applied when none are configured
    pub fn builtin_exclusions(&self) -> &'static [&'static str] {
        match self {
            DeviceCategory::AudioInput => exclusions::AUDIO_INPUT,
            DeviceCategory::AudioOutput => exclusions::AUDIO_OUTPUT,
            DeviceCategory::VideoCapture => exclusions::VIDEO,
        }
    }

    fn index(&self) -> usize {
        match self {
            DeviceCategory::AudioInput => 0,
            DeviceCategory::AudioOutput => 1,
            DeviceCategory::VideoCapture => 2,
        }
    }
}

impl std::fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCategory::AudioInput => write!(f, "audio input"),
            DeviceCategory::AudioOutput => write!(f, "audio output"),
            DeviceCategory::VideoCapture => write!(f, "video capture"),
        }
    }
}

/// USB `vendor:product` id embedded in a device id
///
/// Matches the `vid_XXXX&pid_XXXX` form used by Windows device paths and
/// some virtual device ids.
pub fn usb_id_from_device_id(id: &str) -> Option<String> {
    let lower = id.to_ascii_lowercase();
    let hex4 = |s: &str| -> Option<String> {
        let digits = s.get(..4)?;
        digits.chars().all(|c| c.is_ascii_hexdigit()).then(|| digits.to_string())
    };

    let vid_at = lower.find("vid_")?;
    let vendor = hex4(&lower[vid_at + 4..])?;
    let pid_at = lower[vid_at..].find("pid_")? + vid_at;
    let product = hex4(&lower[pid_at + 4..])?;
    Some(format!("{}:{}", vendor, product))
}

/// Discovers devices and builds capturers for them
///
/// Enumeration and window listing require a successful [`init`]. Factories,
/// exclusion lists and max-format ceilings are configuration and can be set
/// at any time; they survive `init`/`terminate` cycles.
///
/// [`init`]: DeviceManager::init
pub struct DeviceManager {
    audio: Box<dyn AudioEnumerator>,
    video: Box<dyn VideoEnumerator>,
    window_picker: Box<dyn WindowPicker>,
    subsystem: Arc<dyn PlatformSubsystem>,
    subsystem_ref: Option<SubsystemRef>,
    video_factory: Option<Box<dyn VideoDeviceCapturerFactory>>,
    screen_factory: Option<Box<dyn ScreenCapturerFactory>>,
    /// Indexed by `DeviceCategory::index`
    exclusions: [Option<Vec<String>>; 3],
    max_formats: BTreeMap<String, VideoFormat>,
}

impl DeviceManager {
    /// Manager over the host platform backends
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DeviceManagerBuilder {
        DeviceManagerBuilder::default()
    }

    /// Host manager with the exclusions and ceilings from `config` applied
    pub fn from_config(config: &Config) -> Self {
        let mut manager = Self::new();
        config.apply(&mut manager);
        manager
    }

    // ===== Lifecycle =====

    /// Acquire the platform subsystem
    pub fn init(&mut self) -> DeviceResult<()> {
        if self.subsystem_ref.is_some() {
            return Err(DeviceError::AlreadyInitialized);
        }

        let subsystem_ref = SubsystemRef::acquire(Arc::clone(&self.subsystem)).map_err(|e| {
            error!(error = %e, "Failed to initialize platform subsystem");
            e
        })?;
        self.subsystem_ref = Some(subsystem_ref);
        info!("Device manager initialized");
        Ok(())
    }

    /// Release the platform subsystem; no-op unless initialized
    pub fn terminate(&mut self) {
        if self.subsystem_ref.take().is_some() {
            info!("Device manager terminated");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.subsystem_ref.is_some()
    }

    fn ensure_initialized(&self) -> DeviceResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(DeviceError::NotInitialized)
        }
    }

    // ===== Enumeration =====

    /// Devices of one category with its exclusions applied
    pub fn devices(&self, category: DeviceCategory) -> DeviceResult<Vec<Device>> {
        self.ensure_initialized()?;

        let mut devices = match category {
            DeviceCategory::AudioInput => self.audio.audio_input_devices()?,
            DeviceCategory::AudioOutput => self.audio.audio_output_devices()?,
            DeviceCategory::VideoCapture => self.video.video_capture_devices()?,
        };
        let found = devices.len();
        filter_devices(&mut devices, self.exclusions(category))?;

        debug!(%category, found, returned = devices.len(), "Enumerated devices");
        Ok(devices)
    }

    pub fn audio_input_devices(&self) -> DeviceResult<Vec<Device>> {
        self.devices(DeviceCategory::AudioInput)
    }

    pub fn audio_output_devices(&self) -> DeviceResult<Vec<Device>> {
        self.devices(DeviceCategory::AudioOutput)
    }

    pub fn video_capture_devices(&self) -> DeviceResult<Vec<Device>> {
        self.devices(DeviceCategory::VideoCapture)
    }

    // ===== Lookup =====

    fn find_by_name(&self, category: DeviceCategory, name: &str) -> DeviceResult<Device> {
        self.devices(category)?
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| {
                debug!(%category, name, "No device with that name");
                DeviceError::NotFound(name.to_string())
            })
    }

    /// Audio devices resolve the default name to the system default endpoint
    fn audio_device(&self, category: DeviceCategory, name: &str) -> DeviceResult<Device> {
        if name == DEFAULT_DEVICE_NAME {
            return Ok(Device::new(DEFAULT_DEVICE_NAME, DEFAULT_DEVICE_ID));
        }
        self.find_by_name(category, name)
    }

    pub fn audio_input_device(&self, name: &str) -> DeviceResult<Device> {
        self.audio_device(DeviceCategory::AudioInput, name)
    }

    pub fn audio_output_device(&self, name: &str) -> DeviceResult<Device> {
        self.audio_device(DeviceCategory::AudioOutput, name)
    }

    /// Camera by name; the default name selects the first camera
    pub fn video_capture_device(&self, name: &str) -> DeviceResult<Device> {
        if name.is_empty() || name == DEFAULT_DEVICE_NAME {
            return self.default_video_capture_device();
        }
        self.find_by_name(DeviceCategory::VideoCapture, name)
    }

    /// First enumerated camera
    pub fn default_video_capture_device(&self) -> DeviceResult<Device> {
        self.video_capture_devices()?
            .into_iter()
            .next()
            .ok_or_else(|| DeviceError::NotFound("default video capture device".to_string()))
    }

    // ===== Capturers =====

    pub fn set_video_device_capturer_factory(&mut self, factory: Box<dyn VideoDeviceCapturerFactory>) {
        self.video_factory = Some(factory);
    }

    pub fn set_screen_capturer_factory(&mut self, factory: Box<dyn ScreenCapturerFactory>) {
        self.screen_factory = Some(factory);
    }

    /// Build a capturer for `device`, constrained by its max format if any
    pub fn create_video_capturer(&self, device: &Device) -> DeviceResult<Box<dyn VideoCapturer>> {
        let factory = self
            .video_factory
            .as_ref()
            .ok_or_else(|| DeviceError::NoFactory("video device".to_string()))?;

        let mut capturer = factory.create(device)?;
        info!(device = %device.name, "Created video capturer");

        let max_format = self.max_format_for(device);
        capturer.set_enable_camera_list(max_format.is_some());
        if let Some(max_format) = max_format {
            debug!(device = %device.name, max = %max_format, "Constraining capture formats");
            capturer.constrain_supported_formats(max_format);
        }
        Ok(capturer)
    }

    pub fn create_screen_capturer(&self, id: &ScreencastId) -> DeviceResult<Box<dyn VideoCapturer>> {
        let factory = self.screen_factory.as_ref().ok_or_else(|| {
            error!("No screen capturer factory");
            DeviceError::NoFactory("screen".to_string())
        })?;

        let capturer = factory.create(id)?;
        info!(screencast = %id, "Created screen capturer");
        Ok(capturer)
    }

    // ===== Max-format whitelist =====

    /// Cap the formats offered for `key`: a device name, a USB id or `*`
    pub fn set_video_capture_device_max_format(&mut self, key: &str, max_format: VideoFormat) -> DeviceResult<()> {
        if !max_format.is_valid() {
            return Err(DeviceError::InvalidFormat(format!("{} for {}", max_format, key)));
        }
        debug!(key, max = %max_format, "Setting max format");
        self.max_formats.insert(key.to_string(), max_format);
        Ok(())
    }

    /// Remove the ceiling for `key`; absent keys are ignored
    pub fn clear_video_capture_device_max_format(&mut self, key: &str) {
        if self.max_formats.remove(key).is_some() {
            debug!(key, "Cleared max format");
        }
    }

    /// USB id of a device, from its id or from the video backend
    pub fn usb_id(&self, device: &Device) -> Option<String> {
        usb_id_from_device_id(&device.id).or_else(|| self.video.usb_id(device))
    }

    /// Ceiling applied to `device`: by USB id, then name, then wildcard
    ///
    /// USB ids match keys case-insensitively; names match exactly.
    pub fn max_format_for(&self, device: &Device) -> Option<VideoFormat> {
        if !self.max_formats.is_empty()
            && let Some(usb_id) = self.usb_id(device)
            && let Some((_, format)) = self
                .max_formats
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&usb_id))
        {
            return Some(*format);
        }
        self.max_formats
            .get(&device.name)
            .or_else(|| self.max_formats.get(WILDCARD))
            .copied()
    }

    /// Configured ceilings by key
    pub fn max_formats(&self) -> &BTreeMap<String, VideoFormat> {
        &self.max_formats
    }

    // ===== Exclusions =====

    /// Patterns applied to `category`, `None` when filtering is disabled
    pub fn exclusions(&self, category: DeviceCategory) -> Option<&[String]> {
        self.exclusions[category.index()].as_deref()
    }

    pub fn set_exclusions(&mut self, category: DeviceCategory, patterns: Option<Vec<String>>) {
        if let Some(patterns) = &patterns
            && patterns.iter().any(String::is_empty)
        {
            warn!(%category, "Empty exclusion pattern configured; enumeration will fail");
        }
        self.exclusions[category.index()] = patterns;
    }

    // ===== Screen capture targets =====

    fn ensure_picker_supported(&self, what: &str) -> DeviceResult<()> {
        self.ensure_initialized()?;
        if self.window_picker.is_supported() {
            Ok(())
        } else {
            info!("{} capture is not supported in this session", what);
            Err(DeviceError::Unsupported(format!("{} capture", what)))
        }
    }

    pub fn windows(&self) -> DeviceResult<Vec<WindowDescription>> {
        self.ensure_picker_supported("window")?;
        self.window_picker.windows()
    }

    pub fn desktops(&self) -> DeviceResult<Vec<DesktopDescription>> {
        self.ensure_picker_supported("desktop")?;
        self.window_picker.desktops()
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceManager")
            .field("initialized", &self.is_initialized())
            .field("exclusions", &self.exclusions)
            .field("max_formats", &self.max_formats)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`DeviceManager`], starting from the host backends
pub struct DeviceManagerBuilder {
    audio: Box<dyn AudioEnumerator>,
    video: Box<dyn VideoEnumerator>,
    window_picker: Box<dyn WindowPicker>,
    subsystem: Arc<dyn PlatformSubsystem>,
    video_factory: Option<Box<dyn VideoDeviceCapturerFactory>>,
    screen_factory: Option<Box<dyn ScreenCapturerFactory>>,
    exclusions: [Option<Vec<String>>; 3],
}

impl Default for DeviceManagerBuilder {
    fn default() -> Self {
        let builtin = |category: DeviceCategory| {
            Some(
                category
                    .builtin_exclusions()
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>(),
            )
        };

        Self {
            audio: Box::new(PipeWireAudioEnumerator),
            video: Box::new(V4l2Enumerator::host()),
            window_picker: host_window_picker(),
            subsystem: Arc::new(HostSubsystem),
            video_factory: Some(Box::new(V4l2CapturerFactory)),
            screen_factory: Some(Box::new(X11ScreenCapturerFactory)),
            exclusions: DeviceCategory::ALL.map(builtin),
        }
    }
}

impl DeviceManagerBuilder {
    pub fn audio_enumerator(mut self, audio: impl AudioEnumerator + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn video_enumerator(mut self, video: impl VideoEnumerator + 'static) -> Self {
        self.video = Box::new(video);
        self
    }

    pub fn window_picker(mut self, picker: impl WindowPicker + 'static) -> Self {
        self.window_picker = Box::new(picker);
        self
    }

    /// Shared so callers can keep a handle to observe it
    pub fn subsystem(mut self, subsystem: Arc<dyn PlatformSubsystem>) -> Self {
        self.subsystem = subsystem;
        self
    }

    pub fn video_capturer_factory(mut self, factory: impl VideoDeviceCapturerFactory + 'static) -> Self {
        self.video_factory = Some(Box::new(factory));
        self
    }

    pub fn screen_capturer_factory(mut self, factory: impl ScreenCapturerFactory + 'static) -> Self {
        self.screen_factory = Some(Box::new(factory));
        self
    }

    /// Start without any capturer factory
    pub fn without_capturer_factories(mut self) -> Self {
        self.video_factory = None;
        self.screen_factory = None;
        self
    }

    /// Replace the exclusions of one category; `None` disables filtering
    pub fn exclusions(mut self, category: DeviceCategory, patterns: Option<Vec<String>>) -> Self {
        self.exclusions[category.index()] = patterns;
        self
    }

    pub fn build(self) -> DeviceManager {
        DeviceManager {
            audio: self.audio,
            video: self.video,
            window_picker: self.window_picker,
            subsystem: self.subsystem,
            subsystem_ref: None,
            video_factory: self.video_factory,
            screen_factory: self.screen_factory,
            exclusions: self.exclusions,
            max_formats: BTreeMap::new(),
        }
    }
}
