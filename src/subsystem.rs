// SPDX-License-Identifier: GPL-3.0-only

//! Process-wide platform subsystem reference counting
//!
//! Some platforms need per-process setup before devices can be enumerated
//! and a matching teardown afterwards. Each initialized [`DeviceManager`]
//! holds exactly one [`SubsystemRef`]; dropping it releases the platform.
//!
//! [`DeviceManager`]: crate::DeviceManager

use crate::errors::DeviceResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Outcome of a successful platform initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// This call set the platform up
    Initialized,
    /// The process had already set the platform up; still needs a release
    AlreadyInitialized,
}

/// Per-process platform setup and teardown
pub trait PlatformSubsystem: Send + Sync {
    fn initialize(&self) -> DeviceResult<InitStatus>;

    /// Undo one successful `initialize`
    fn uninitialize(&self);
}

/// Host subsystem; Linux needs no per-process setup
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSubsystem;

impl PlatformSubsystem for HostSubsystem {
    fn initialize(&self) -> DeviceResult<InitStatus> {
        Ok(InitStatus::Initialized)
    }

    fn uninitialize(&self) {}
}

/// One acquisition of a platform subsystem, released on drop
pub struct SubsystemRef {
    subsystem: Arc<dyn PlatformSubsystem>,
}

impl SubsystemRef {
    /// Initialize the subsystem and take a reference to it
    ///
    /// A failed initialization acquires nothing.
    pub fn acquire(subsystem: Arc<dyn PlatformSubsystem>) -> DeviceResult<Self> {
        let status = subsystem.initialize()?;
        debug!(?status, "Platform subsystem acquired");
        Ok(Self { subsystem })
    }
}

impl Drop for SubsystemRef {
    fn drop(&mut self) {
        self.subsystem.uninitialize();
        debug!("Platform subsystem released");
    }
}

impl std::fmt::Debug for SubsystemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsystemRef").finish_non_exhaustive()
    }
}

/// How a [`CountingSubsystem`] answers `initialize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FakeInitMode {
    #[default]
    Succeed,
    AlreadyInitialized,
    Fail,
}

#[derive(Debug, Default)]
struct Counters {
    initialized: AtomicUsize,
    uninitialized: AtomicUsize,
}

/// Subsystem that counts calls; clones share their counters
#[derive(Debug, Clone, Default)]
pub struct CountingSubsystem {
    mode: FakeInitMode,
    counters: Arc<Counters>,
}

impl CountingSubsystem {
    pub fn new(mode: FakeInitMode) -> Self {
        Self {
            mode,
            counters: Arc::default(),
        }
    }

    /// Successful `initialize` calls
    pub fn initialize_count(&self) -> usize {
        self.counters.initialized.load(Ordering::SeqCst)
    }

    pub fn uninitialize_count(&self) -> usize {
        self.counters.uninitialized.load(Ordering::SeqCst)
    }

    /// Acquisitions not yet released
    pub fn outstanding(&self) -> usize {
        self.initialize_count().saturating_sub(self.uninitialize_count())
    }
}

impl PlatformSubsystem for CountingSubsystem {
    fn initialize(&self) -> DeviceResult<InitStatus> {
        let status = match self.mode {
            FakeInitMode::Succeed => InitStatus::Initialized,
            FakeInitMode::AlreadyInitialized => InitStatus::AlreadyInitialized,
            FakeInitMode::Fail => {
                return Err(crate::errors::DeviceError::SubsystemInit(
                    "simulated platform failure".to_string(),
                ));
            }
        };
        self.counters.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(status)
    }

    fn uninitialize(&self) {
        self.counters.uninitialized.fetch_add(1, Ordering::SeqCst);
    }
}
