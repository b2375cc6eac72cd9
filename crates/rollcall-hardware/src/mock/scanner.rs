//! Mock device scanner with a controllable device list.

use crate::{HardwareError, Result, traits::DeviceScanner};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Scanner returning a device list set by the test.
///
/// Clones share the same list, so a test can keep one clone and hand the
/// other to the reader manager.
#[derive(Debug, Clone, Default)]
pub struct MockScanner {
    devices: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl MockScanner {
    /// Scanner with no devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner reporting the given devices.
    pub fn with_devices<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scanner = Self::new();
        scanner.set_devices(devices);
        scanner
    }

    /// Replace the reported device list.
    pub fn set_devices<I, S>(&self, devices: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        *list = devices.into_iter().map(Into::into).collect();
    }

    /// Remove every device.
    pub fn unplug_all(&self) {
        self.set_devices(Vec::<String>::new());
    }

    /// Make subsequent scans fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl DeviceScanner for MockScanner {
    async fn scan(&self) -> Result<Vec<String>> {
        if self.failing.load(Ordering::Acquire) {
            return Err(HardwareError::enumeration("mock scan failure"));
        }
        Ok(self
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
