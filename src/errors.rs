// SPDX-License-Identifier: MPL-2.0

//! Error types for device management

use std::fmt;

/// Result type alias using DeviceError
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Device manager error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Operation requires a successful `init` first
    NotInitialized,
    /// `init` called twice without `terminate`
    AlreadyInitialized,
    /// Platform subsystem could not be initialized
    SubsystemInit(String),
    /// Platform enumeration API failed
    Enumeration(String),
    /// No device with the requested name
    NotFound(String),
    /// Capability not available on this platform or build
    Unsupported(String),
    /// No capturer factory registered
    NoFactory(String),
    /// Video format fails validation
    InvalidFormat(String),
    /// Exclusion pattern list is malformed
    InvalidPattern(String),
    /// Capturer construction failed
    CaptureFailed(String),
    /// Configuration errors
    Config(String),
    /// I/O errors
    Io(String),
}

impl DeviceError {
    /// Whether the caller should treat this as "skip", not as a failure
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DeviceError::Unsupported(_))
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotInitialized => write!(f, "Device manager not initialized"),
            DeviceError::AlreadyInitialized => write!(f, "Device manager already initialized"),
            DeviceError::SubsystemInit(msg) => write!(f, "Platform initialization failed: {}", msg),
            DeviceError::Enumeration(msg) => write!(f, "Enumeration failed: {}", msg),
            DeviceError::NotFound(name) => write!(f, "Device not found: {}", name),
            DeviceError::Unsupported(what) => write!(f, "Not supported: {}", what),
            DeviceError::NoFactory(kind) => write!(f, "No {} capturer factory registered", kind),
            DeviceError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            DeviceError::InvalidPattern(msg) => write!(f, "Invalid exclusion pattern: {}", msg),
            DeviceError::CaptureFailed(msg) => write!(f, "Capturer creation failed: {}", msg),
            DeviceError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DeviceError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<std::io::Error> for DeviceError {
    fn from(err: std::io::Error) -> Self {
        DeviceError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DeviceError {
    fn from(err: serde_json::Error) -> Self {
        DeviceError::Config(err.to_string())
    }
}
