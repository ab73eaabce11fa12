// SPDX-License-Identifier: GPL-3.0-only

//! X11 window picker and screen capturer
//!
//! Windows come from the window manager's `_NET_CLIENT_LIST` and desktops
//! from `_NET_NUMBER_OF_DESKTOPS` / `_NET_DESKTOP_NAMES`, so listing needs an
//! EWMH-compliant window manager. Without one the desktop list falls back to
//! a single desktop covering the root window.

use super::WindowPicker;
use crate::backends::camera::{CaptureFormats, ScreenCapturerFactory, VideoCapturer};
use crate::backends::types::{
    DesktopDescription, DesktopId, FourCc, ScreencastId, VideoFormat, WindowDescription, WindowId,
};
use crate::constants::screen::SCREENCAST_FPS;
use crate::errors::{DeviceError, DeviceResult};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, GetPropertyReply, Window};
use x11rb::rust_connection::RustConnection;

/// Upper bound, in 32-bit units, for property reads
const MAX_PROPERTY_LEN: u32 = 4096;

x11rb::atom_manager! {
    pub EwmhAtoms: EwmhAtomsCookie {
        _NET_CLIENT_LIST,
        _NET_WM_NAME,
        _NET_NUMBER_OF_DESKTOPS,
        _NET_DESKTOP_NAMES,
        _NET_CURRENT_DESKTOP,
        UTF8_STRING,
    }
}

fn x11_error(err: impl std::fmt::Display) -> DeviceError {
    DeviceError::Enumeration(format!("X11: {}", err))
}

/// One connection to the display, with the atoms interned
struct Session {
    conn: RustConnection,
    root: Window,
    root_size: (u32, u32),
    atoms: EwmhAtoms,
}

impl Session {
    fn open() -> DeviceResult<Self> {
        let (conn, screen_num) = x11rb::connect(None).map_err(x11_error)?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| x11_error(format!("screen {} not found", screen_num)))?;
        let root = screen.root;
        let root_size = (screen.width_in_pixels as u32, screen.height_in_pixels as u32);

        let atoms = EwmhAtoms::new(&conn)
            .map_err(x11_error)?
            .reply()
            .map_err(x11_error)?;

        Ok(Self {
            conn,
            root,
            root_size,
            atoms,
        })
    }

    fn property(
        &self,
        window: Window,
        property: Atom,
        type_: impl Into<Atom>,
    ) -> DeviceResult<GetPropertyReply> {
        self.conn
            .get_property(false, window, property, type_, 0, MAX_PROPERTY_LEN)
            .map_err(x11_error)?
            .reply()
            .map_err(x11_error)
    }

    fn property32(&self, window: Window, property: Atom, type_: impl Into<Atom>) -> DeviceResult<Vec<u32>> {
        let reply = self.property(window, property, type_)?;
        Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
    }

    /// `_NET_WM_NAME`, falling back to the legacy `WM_NAME`
    fn window_title(&self, window: Window) -> DeviceResult<String> {
        let utf8 = self.property(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?;
        if !utf8.value.is_empty() {
            return Ok(String::from_utf8_lossy(&utf8.value).to_string());
        }
        let legacy = self.property(window, AtomEnum::WM_NAME.into(), AtomEnum::STRING)?;
        Ok(String::from_utf8_lossy(&legacy.value).to_string())
    }

    fn desktop_count(&self) -> DeviceResult<u32> {
        let count = self.property32(self.root, self.atoms._NET_NUMBER_OF_DESKTOPS, AtomEnum::CARDINAL)?;
        Ok(count.first().copied().unwrap_or(1).max(1))
    }

    fn geometry(&self, window: Window) -> DeviceResult<(u32, u32)> {
        let geometry = self
            .conn
            .get_geometry(window)
            .map_err(x11_error)?
            .reply()
            .map_err(x11_error)?;
        Ok((geometry.width as u32, geometry.height as u32))
    }
}

/// Describe each client that has a title
///
/// Clients whose title cannot be read are skipped; they are usually windows
/// closed after the client list was fetched.
fn titled_windows(
    clients: &[Window],
    mut window_title: impl FnMut(Window) -> DeviceResult<String>,
) -> Vec<WindowDescription> {
    let mut windows = Vec::with_capacity(clients.len());
    for &window in clients {
        let title = match window_title(window) {
            Ok(title) => title,
            Err(e) => {
                debug!(window, error = %e, "Skipping unreadable window");
                continue;
            }
        };
        if title.is_empty() {
            debug!(window, "Skipping untitled window");
            continue;
        }
        windows.push(WindowDescription {
            id: WindowId(window as u64),
            title,
        });
    }
    windows
}

/// Window picker for X11 sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct X11WindowPicker;

impl WindowPicker for X11WindowPicker {
    fn is_supported(&self) -> bool {
        std::env::var_os("DISPLAY").is_some_and(|display| !display.is_empty())
    }

    fn windows(&self) -> DeviceResult<Vec<WindowDescription>> {
        let session = Session::open()?;
        let clients = session.property32(session.root, session.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW)?;

        let windows = titled_windows(&clients, |window| session.window_title(window));
        debug!(count = windows.len(), "Enumerated X11 windows");
        Ok(windows)
    }

    fn desktops(&self) -> DeviceResult<Vec<DesktopDescription>> {
        let session = Session::open()?;
        let count = session.desktop_count()?;

        let names_reply = session.property(
            session.root,
            session.atoms._NET_DESKTOP_NAMES,
            session.atoms.UTF8_STRING,
        )?;
        let names: Vec<String> = names_reply
            .value
            .split(|&b| b == 0)
            .map(|name| String::from_utf8_lossy(name).to_string())
            .collect();

        let current = session
            .property32(session.root, session.atoms._NET_CURRENT_DESKTOP, AtomEnum::CARDINAL)?
            .first()
            .copied()
            .unwrap_or(0);

        let desktops: Vec<DesktopDescription> = (0..count)
            .map(|index| {
                let title = names
                    .get(index as usize)
                    .filter(|name| !name.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("Desktop {}", index + 1));
                DesktopDescription {
                    id: DesktopId(index as u64),
                    title,
                    primary: index == current,
                }
            })
            .collect();

        debug!(count = desktops.len(), current, "Enumerated X11 desktops");
        Ok(desktops)
    }
}

/// Capturer bound to an X11 window or desktop
///
/// Offers a single BGRA format at the target's current size.
#[derive(Debug, Clone)]
pub struct X11ScreenCapturer {
    id: String,
    formats: CaptureFormats,
}

impl X11ScreenCapturer {
    pub fn open(target: &ScreencastId) -> DeviceResult<Self> {
        let session = Session::open().map_err(|e| DeviceError::CaptureFailed(e.to_string()))?;

        let (width, height) = match target {
            ScreencastId::Window(window) => {
                let window = u32::try_from(window.0)
                    .map_err(|_| DeviceError::CaptureFailed(format!("invalid window id {}", target)))?;
                session
                    .geometry(window)
                    .map_err(|e| DeviceError::CaptureFailed(e.to_string()))?
            }
            ScreencastId::Desktop(desktop) => {
                let count = session
                    .desktop_count()
                    .map_err(|e| DeviceError::CaptureFailed(e.to_string()))?;
                if desktop.0 >= count as u64 {
                    return Err(DeviceError::CaptureFailed(format!(
                        "{} out of range ({} desktops)",
                        target, count
                    )));
                }
                session.root_size
            }
        };

        let format = VideoFormat::with_fps(width, height, SCREENCAST_FPS, FourCc::BGRA);
        info!(screencast = %target, format = %format, "Opened X11 screen capturer");

        Ok(Self {
            id: target.to_string(),
            formats: CaptureFormats::new(vec![format], vec![FourCc::BGRA, FourCc::ARGB]),
        })
    }
}

impl VideoCapturer for X11ScreenCapturer {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_screencast(&self) -> bool {
        true
    }

    fn formats(&self) -> &CaptureFormats {
        &self.formats
    }

    fn formats_mut(&mut self) -> &mut CaptureFormats {
        &mut self.formats
    }
}

/// Production factory for window and desktop capturers
#[derive(Debug, Clone, Copy, Default)]
pub struct X11ScreenCapturerFactory;

impl ScreenCapturerFactory for X11ScreenCapturerFactory {
    fn create(&self, id: &ScreencastId) -> DeviceResult<Box<dyn VideoCapturer>> {
        Ok(Box::new(X11ScreenCapturer::open(id)?))
    }
}
