//! The kiosk event loop.
//!
//! Connects the reader manager to the coordinator: each card read is handled
//! on its own task, and reader status changes and errors are forwarded to
//! the display as [`KioskEvent`]s.

use crate::coordinator::AttendanceCoordinator;
use crate::events::{EventSink, KioskEvent};
use rollcall_hardware::{ReaderEvent, ReaderHandle};
use rollcall_storage::{AttendanceRepository, StudentRepository};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Drives a coordinator from reader events
pub struct KioskRuntime<S, A> {
    coordinator: Arc<AttendanceCoordinator<S, A>>,
    events: EventSink,
}

impl<S, A> KioskRuntime<S, A>
where
    S: StudentRepository + 'static,
    A: AttendanceRepository + 'static,
{
    pub fn new(coordinator: AttendanceCoordinator<S, A>, events: EventSink) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            events,
        }
    }

    pub fn coordinator(&self) -> &Arc<AttendanceCoordinator<S, A>> {
        &self.coordinator
    }

    /// Process reader events until `shutdown` resolves or the reader stops.
    ///
    /// Stops the reader, then waits for taps already being processed.
    pub async fn run<F>(&self, mut reader: ReaderHandle, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut taps = JoinSet::new();
        tokio::pin!(shutdown);

        info!("Kiosk running");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                Some(finished) = taps.join_next(), if !taps.is_empty() => {
                    if let Err(e) = finished {
                        error!(error = %e, "Card tap task failed");
                    }
                }
                event = reader.recv() => match event {
                    Some(ReaderEvent::CardRead(read)) => {
                        let coordinator = Arc::clone(&self.coordinator);
                        taps.spawn(async move {
                            coordinator.handle_card_read(read).await;
                        });
                    }
                    Some(ReaderEvent::StatusChanged { status, message }) => {
                        self.events.emit(KioskEvent::RfidStatusChanged { status, message });
                    }
                    Some(ReaderEvent::Error { message }) => {
                        self.events.emit(KioskEvent::rfid_error(message));
                    }
                    Some(other) => debug!(?other, "Ignoring reader event"),
                    None => {
                        info!("Reader stopped");
                        break;
                    }
                },
            }
        }

        reader.shutdown().await?;

        while let Some(finished) = taps.join_next().await {
            if let Err(e) = finished {
                error!(error = %e, "Card tap task failed");
            }
        }

        info!("Kiosk stopped");
        Ok(())
    }
}
