// SPDX-License-Identifier: MPL-2.0

//! Window and desktop enumeration for screen capture
//!
//! A [`WindowPicker`] answers whether screen capture is possible in the
//! current session and lists the windows and desktops that can be captured.
//! On Linux the host picker speaks EWMH over X11; elsewhere, or without a
//! display, [`UnsupportedWindowPicker`] reports that nothing can be captured.

pub mod x11;

pub use x11::{X11ScreenCapturer, X11ScreenCapturerFactory, X11WindowPicker};

use crate::backends::types::{DesktopDescription, WindowDescription};
use crate::errors::DeviceResult;

/// Lists capturable windows and desktops
pub trait WindowPicker: Send + Sync {
    /// Whether the current session allows window and desktop capture
    fn is_supported(&self) -> bool;

    fn windows(&self) -> DeviceResult<Vec<WindowDescription>>;

    fn desktops(&self) -> DeviceResult<Vec<DesktopDescription>>;
}

/// Picker for sessions without screen capture
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedWindowPicker;

impl WindowPicker for UnsupportedWindowPicker {
    fn is_supported(&self) -> bool {
        false
    }

    fn windows(&self) -> DeviceResult<Vec<WindowDescription>> {
        Ok(Vec::new())
    }

    fn desktops(&self) -> DeviceResult<Vec<DesktopDescription>> {
        Ok(Vec::new())
    }
}

/// Picker returning fixed lists
#[derive(Debug, Clone, Default)]
pub struct FakeWindowPicker {
    pub windows: Vec<WindowDescription>,
    pub desktops: Vec<DesktopDescription>,
}

impl FakeWindowPicker {
    pub fn new(windows: Vec<WindowDescription>, desktops: Vec<DesktopDescription>) -> Self {
        Self { windows, desktops }
    }
}

impl WindowPicker for FakeWindowPicker {
    fn is_supported(&self) -> bool {
        true
    }

    fn windows(&self) -> DeviceResult<Vec<WindowDescription>> {
        Ok(self.windows.clone())
    }

    fn desktops(&self) -> DeviceResult<Vec<DesktopDescription>> {
        Ok(self.desktops.clone())
    }
}

/// Picker for the running session
///
/// X11 when a display is reachable, otherwise unsupported.
pub fn host_window_picker() -> Box<dyn WindowPicker> {
    let picker = X11WindowPicker;
    if picker.is_supported() {
        Box::new(picker)
    } else {
        Box::new(UnsupportedWindowPicker)
    }
}
