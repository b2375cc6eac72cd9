//! Card reader manager.
//!
//! The manager owns one card reader and one device scanner. Starting it
//! spawns two tasks feeding a single event channel:
//!
//! ```text
//! ┌──────────────┐  CardRead    ┌─────────────────┐
//! │ Reader task  │─────────────►│                 │
//! └──────────────┘              │  Event Channel  │──────► Kiosk
//! ┌──────────────┐  Status/Error│  (mpsc)         │
//! │ Monitor task │─────────────►│                 │
//! └──────────────┘              └─────────────────┘
//! ```
//!
//! The monitor task runs device discovery once, starts reading if a reader
//! was found, and then re-scans every poll interval to report disconnects
//! and reconnects. Nothing in here is fatal: failures become
//! [`ReaderEvent::Error`] events and the kiosk keeps listening.
//!
//! # Examples
//!
//! ```no_run
//! use rollcall_hardware::devices::{AnyCardReader, AnyDeviceScanner};
//! use rollcall_hardware::manager::{ReaderConfig, ReaderManager};
//! use rollcall_hardware::mock::{MockCardReader, MockScanner};
//!
//! #[tokio::main]
//! async fn main() -> rollcall_hardware::Result<()> {
//!     let (reader, _cards) = MockCardReader::new();
//!     let scanner = MockScanner::with_devices(["USB RFID Reader"]);
//!
//!     let manager = ReaderManager::new(
//!         ReaderConfig::default(),
//!         AnyCardReader::Mock(reader),
//!         AnyDeviceScanner::Mock(scanner),
//!     );
//!     let mut handle = manager.start();
//!
//!     while let Some(event) = handle.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     handle.shutdown().await
//! }
//! ```

use crate::devices::{AnyCardReader, AnyDeviceScanner};
use crate::error::{HardwareError, Result};
use crate::traits::{CardReader, DeviceScanner};
use crate::types::{ReaderEvent, ReaderStatus, ReadingGate};
use rollcall_core::constants::{
    CARD_READ_TIMEOUT_MS, DEVICE_POLL_INTERVAL_SECS, READER_EVENT_CHANNEL_SIZE,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Configuration for the reader manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Interval between device presence checks.
    pub poll_interval: Duration,

    /// Maximum gap between keystrokes of one card read.
    pub card_timeout: Duration,

    /// Start reading as soon as a reader is found.
    pub auto_start: bool,

    /// Resume reading after a reconnect.
    pub resume_on_reconnect: bool,

    /// Capacity of the event channel.
    pub channel_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEVICE_POLL_INTERVAL_SECS),
            card_timeout: Duration::from_millis(CARD_READ_TIMEOUT_MS),
            auto_start: true,
            resume_on_reconnect: true,
            channel_size: READER_EVENT_CHANNEL_SIZE,
        }
    }
}

impl ReaderConfig {
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn card_timeout(mut self, timeout: Duration) -> Self {
        self.card_timeout = timeout;
        self
    }

    #[must_use]
    pub fn auto_start(mut self, enabled: bool) -> Self {
        self.auto_start = enabled;
        self
    }

    #[must_use]
    pub fn resume_on_reconnect(mut self, enabled: bool) -> Self {
        self.resume_on_reconnect = enabled;
        self
    }
}

#[derive(Debug)]
struct ControlInner {
    gate: ReadingGate,
    device: Mutex<Option<String>>,
    // Only the reader task holds a strong sender
    events: mpsc::WeakSender<ReaderEvent>,
}

/// Cloneable control surface for the reader lifecycle.
///
/// Tracks which device is connected and whether the reader is listening.
/// Every state change is reported on the manager's event channel.
#[derive(Debug, Clone)]
pub struct ReaderControl {
    inner: Arc<ControlInner>,
}

impl ReaderControl {
    fn new(gate: ReadingGate, events: mpsc::WeakSender<ReaderEvent>) -> Self {
        Self {
            inner: Arc::new(ControlInner {
                gate,
                device: Mutex::new(None),
                events,
            }),
        }
    }

    /// Name of the connected device, if any.
    pub fn connected_device(&self) -> Option<String> {
        self.inner
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected_device().is_some()
    }

    pub fn is_reading(&self) -> bool {
        self.inner.gate.is_open()
    }

    /// Current status, derived from connection and reading state.
    pub fn status(&self) -> ReaderStatus {
        match (self.is_connected(), self.is_reading()) {
            (true, true) => ReaderStatus::Reading,
            (true, false) => ReaderStatus::Connected,
            (false, _) => ReaderStatus::Disconnected,
        }
    }

    /// Start accepting card reads.
    ///
    /// Does nothing if the reader is already reading.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` when no reader is connected; an
    /// error event is emitted as well.
    pub fn start_reading(&self) -> Result<()> {
        let Some(device) = self.connected_device() else {
            self.emit(ReaderEvent::error("RFID reader not connected"));
            return Err(HardwareError::disconnected("RFID reader"));
        };

        if self.inner.gate.open() {
            return Ok(());
        }

        info!(device = %device, "Started reading RFID cards");
        self.emit(ReaderEvent::status(
            ReaderStatus::Reading,
            "Started reading RFID cards...",
        ));
        Ok(())
    }

    /// Stop accepting card reads.
    pub fn stop_reading(&self) {
        if !self.inner.gate.close() {
            return;
        }

        info!("Stopped reading RFID cards");
        self.emit(ReaderEvent::status(
            ReaderStatus::Connected,
            "Stopped reading RFID cards",
        ));
    }

    /// Run device discovery and record the first reader found.
    pub async fn initialize<S: DeviceScanner>(&self, scanner: &S) -> bool {
        self.emit(ReaderEvent::status(
            ReaderStatus::Connecting,
            "Initializing USB RFID Reader...",
        ));

        match scanner.scan().await {
            Ok(devices) => match devices.into_iter().next() {
                Some(device) => {
                    info!(device = %device, "RFID reader connected");
                    self.emit(ReaderEvent::status(
                        ReaderStatus::Connected,
                        format!("Connected to {device}"),
                    ));
                    self.set_device(Some(device));
                    true
                }
                None => {
                    warn!("No USB RFID readers found");
                    self.emit(ReaderEvent::status(
                        ReaderStatus::Error,
                        "No USB RFID readers found",
                    ));
                    self.emit(ReaderEvent::error(
                        "No USB RFID readers detected. Please connect a USB RFID reader.",
                    ));
                    false
                }
            },
            Err(e) => {
                error!(error = %e, "RFID reader initialization failed");
                self.emit(ReaderEvent::status(
                    ReaderStatus::Error,
                    "Initialization failed",
                ));
                self.emit(ReaderEvent::error(format!(
                    "Failed to initialize RFID reader: {e}"
                )));
                false
            }
        }
    }

    /// Re-scan and report a disconnect or reconnect.
    ///
    /// Returns `true` if a reconnect was observed.
    pub async fn check_connection<S: DeviceScanner>(&self, scanner: &S) -> bool {
        let devices = match scanner.scan().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "RFID connection check failed");
                self.emit(ReaderEvent::error(format!(
                    "Error checking RFID connection: {e}"
                )));
                return false;
            }
        };

        let was_connected = self.is_connected();
        match (was_connected, devices.into_iter().next()) {
            (true, None) => {
                warn!("RFID reader disconnected");
                self.inner.gate.close();
                self.set_device(None);
                self.emit(ReaderEvent::status(
                    ReaderStatus::Error,
                    "RFID reader disconnected",
                ));
                self.emit(ReaderEvent::error("RFID reader has been disconnected"));
                false
            }
            (false, Some(device)) => {
                info!(device = %device, "RFID reader reconnected");
                self.set_device(Some(device));
                self.emit(ReaderEvent::status(
                    ReaderStatus::Connected,
                    "RFID reader reconnected",
                ));
                true
            }
            _ => false,
        }
    }

    fn set_device(&self, device: Option<String>) {
        *self
            .inner
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = device;
    }

    /// True once the reader task has ended or the handle was dropped.
    pub fn is_closed(&self) -> bool {
        self.inner
            .events
            .upgrade()
            .is_none_or(|events| events.is_closed())
    }

    fn emit(&self, event: ReaderEvent) {
        let Some(events) = self.inner.events.upgrade() else {
            debug!("Reader event channel closed");
            return;
        };
        match events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "Reader event dropped, channel is full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Reader event channel closed");
            }
        }
    }
}

/// Handle for receiving reader events.
pub struct ReaderHandle {
    event_rx: mpsc::Receiver<ReaderEvent>,
    tasks: JoinSet<Result<()>>,
    control: ReaderControl,
}

impl ReaderHandle {
    /// Receive the next reader event.
    ///
    /// Returns `None` once the reader task has ended and the channel is
    /// drained.
    pub async fn recv(&mut self) -> Option<ReaderEvent> {
        self.event_rx.recv().await
    }

    /// Lifecycle control shared with the monitor task.
    pub fn control(&self) -> &ReaderControl {
        &self.control
    }

    /// Stop reading and abort the reader and monitor tasks.
    pub async fn shutdown(mut self) -> Result<()> {
        self.control.stop_reading();
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if error_count + panic_count > 0 {
            warn!(error_count, panic_count, "Reader tasks ended abnormally");
        } else {
            debug!("Reader tasks stopped");
        }
        Ok(())
    }

    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(_)) => TaskTermination::Error,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    Cancelled,
    Panic,
}

/// Owns the reader and scanner until started.
pub struct ReaderManager {
    config: ReaderConfig,
    reader: AnyCardReader,
    scanner: AnyDeviceScanner,
}

impl ReaderManager {
    pub fn new(config: ReaderConfig, reader: AnyCardReader, scanner: AnyDeviceScanner) -> Self {
        Self {
            config,
            reader,
            scanner,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Spawn the reader and monitor tasks and return the event handle.
    pub fn start(self) -> ReaderHandle {
        let (event_tx, event_rx) = mpsc::channel(self.config.channel_size);
        let control = ReaderControl::new(self.reader.reading_gate(), event_tx.downgrade());

        let mut tasks = JoinSet::new();
        tasks.spawn(Self::reader_task(self.reader, control.clone(), event_tx));
        tasks.spawn(Self::monitor_task(self.scanner, control.clone(), self.config));

        ReaderHandle {
            event_rx,
            tasks,
            control,
        }
    }

    async fn reader_task(
        mut reader: AnyCardReader,
        control: ReaderControl,
        tx: mpsc::Sender<ReaderEvent>,
    ) -> Result<()> {
        loop {
            match reader.read_card().await {
                Ok(card) => {
                    if !control.is_reading() {
                        debug!(card_id = %card.card_id, "Discarding card read while not reading");
                        continue;
                    }
                    if tx.send(ReaderEvent::CardRead(card)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(device = %reader.name(), error = %e, "Card reader failed");
                    let _ = tx
                        .send(ReaderEvent::error(format!("RFID reader error: {e}")))
                        .await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn monitor_task(
        scanner: AnyDeviceScanner,
        control: ReaderControl,
        config: ReaderConfig,
    ) -> Result<()> {
        if control.initialize(&scanner).await && config.auto_start {
            control.start_reading()?;
        }

        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if control.is_closed() {
                break;
            }

            if control.check_connection(&scanner).await
                && config.resume_on_reconnect
                && let Err(e) = control.start_reading()
            {
                warn!(error = %e, "Failed to resume reading after reconnect");
            }
        }
        Ok(())
    }
}
