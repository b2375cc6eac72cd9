//! Card reader discovery.
//!
//! Readers are recognized by name. A device counts as a card reader when its
//! name mentions `RFID` or `Card Reader`, or mentions both `HID` and
//! `Keyboard`. Many wedge readers present themselves as a plain keyboard, so
//! scanners can optionally report a synthetic keyboard-emulation device when
//! nothing matches.

use crate::error::{HardwareError, Result};
use crate::traits::DeviceScanner;
use rollcall_core::constants::KEYBOARD_EMULATION_DEVICE;
use std::path::PathBuf;
use tracing::{debug, trace};

/// Default location of the Linux input device list.
pub const PROC_INPUT_DEVICES: &str = "/proc/bus/input/devices";

/// Check whether a device name looks like a card reader.
#[must_use]
pub fn is_reader_name(name: &str) -> bool {
    let upper = name.to_uppercase();
    upper.contains("RFID")
        || upper.contains("CARD READER")
        || (upper.contains("HID") && upper.contains("KEYBOARD"))
}

/// Keep reader-like names, applying the keyboard-emulation fallback when
/// nothing matched.
pub fn select_reader_devices<I>(names: I, keyboard_fallback: bool) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut readers: Vec<String> = names.into_iter().filter(|n| is_reader_name(n)).collect();
    readers.dedup();

    if readers.is_empty() && keyboard_fallback {
        readers.push(KEYBOARD_EMULATION_DEVICE.to_string());
    }
    readers
}

/// Extract device names from the contents of `/proc/bus/input/devices`.
///
/// Each device block carries a line of the form `N: Name="..."`.
pub fn parse_proc_input_devices(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("N: Name="))
        .map(|name| name.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Scanner reading the Linux input device list.
#[derive(Debug, Clone)]
pub struct ProcInputScanner {
    path: PathBuf,
    keyboard_fallback: bool,
}

impl ProcInputScanner {
    pub fn new(keyboard_fallback: bool) -> Self {
        Self::with_path(PROC_INPUT_DEVICES, keyboard_fallback)
    }

    /// Read the device list from a different file.
    pub fn with_path(path: impl Into<PathBuf>, keyboard_fallback: bool) -> Self {
        Self {
            path: path.into(),
            keyboard_fallback,
        }
    }
}

impl DeviceScanner for ProcInputScanner {
    async fn scan(&self) -> Result<Vec<String>> {
        let names = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => parse_proc_input_devices(&contents),
            // No input subsystem to look at, only the fallback can apply
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Input device list not available");
                Vec::new()
            }
            Err(e) => return Err(HardwareError::Io(e)),
        };

        trace!(count = names.len(), "Scanned input devices");
        Ok(select_reader_devices(names, self.keyboard_fallback))
    }
}

/// Scanner enumerating HID devices through hidapi.
#[cfg(feature = "hardware-hid")]
#[derive(Debug, Clone)]
pub struct HidApiScanner {
    keyboard_fallback: bool,
}

#[cfg(feature = "hardware-hid")]
impl HidApiScanner {
    pub fn new(keyboard_fallback: bool) -> Self {
        Self { keyboard_fallback }
    }
}

#[cfg(feature = "hardware-hid")]
impl DeviceScanner for HidApiScanner {
    async fn scan(&self) -> Result<Vec<String>> {
        // hidapi enumeration is blocking
        let names = tokio::task::spawn_blocking(|| -> Result<Vec<String>> {
            let api = hidapi::HidApi::new()
                .map_err(|e| HardwareError::hid_unavailable(e.to_string()))?;
            Ok(api
                .device_list()
                .map(|info| {
                    let manufacturer = info.manufacturer_string().unwrap_or_default();
                    let product = info.product_string().unwrap_or_default();
                    format!("{manufacturer} {product}").trim().to_string()
                })
                .filter(|name| !name.is_empty())
                .collect())
        })
        .await
        .map_err(|e| HardwareError::enumeration(format!("HID enumeration task failed: {e}")))??;

        Ok(select_reader_devices(names, self.keyboard_fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"I: Bus=0003 Vendor=ffff Product=0035 Version=0110
N: Name="Sycreader RFID Technology Co., Ltd SYC ID&IC USB Reader"
P: Phys=usb-0000:00:14.0-2/input0
H: Handlers=sysrq kbd event3 leds

I: Bus=0011 Vendor=0001 Product=0001 Version=ab41
N: Name="AT Translated Set 2 keyboard"
P: Phys=isa0060/serio0/input0
H: Handlers=sysrq kbd event0 leds
"#;

    #[test]
    fn test_is_reader_name() {
        assert!(is_reader_name("USB RFID Reader"));
        assert!(is_reader_name("Generic card reader"));
        assert!(is_reader_name("HID Keyboard Device"));
        assert!(!is_reader_name("HID-compliant mouse"));
        assert!(!is_reader_name("AT Translated Set 2 keyboard"));
    }

    #[test]
    fn test_parse_proc_input_devices() {
        let names = parse_proc_input_devices(SAMPLE);
        assert_eq!(
            names,
            vec![
                "Sycreader RFID Technology Co., Ltd SYC ID&IC USB Reader".to_string(),
                "AT Translated Set 2 keyboard".to_string(),
            ]
        );
    }

    #[test]
    fn test_select_with_match() {
        let names = vec!["USB RFID Reader".to_string(), "Mouse".to_string()];
        assert_eq!(select_reader_devices(names, true), vec!["USB RFID Reader"]);
    }

    #[test]
    fn test_select_fallback() {
        let names = vec!["Mouse".to_string()];
        assert_eq!(
            select_reader_devices(names.clone(), true),
            vec![KEYBOARD_EMULATION_DEVICE.to_string()]
        );
        assert!(select_reader_devices(names, false).is_empty());
    }

    #[tokio::test]
    async fn test_proc_scanner_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let scanner = ProcInputScanner::with_path(file.path(), false);
        let devices = scanner.scan().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].contains("RFID"));
    }

    #[tokio::test]
    async fn test_proc_scanner_missing_file_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("devices");

        let with_fallback = ProcInputScanner::with_path(&missing, true);
        assert_eq!(
            with_fallback.scan().await.unwrap(),
            vec![KEYBOARD_EMULATION_DEVICE.to_string()]
        );

        let without_fallback = ProcInputScanner::with_path(&missing, false);
        assert!(without_fallback.scan().await.unwrap().is_empty());
    }
}
