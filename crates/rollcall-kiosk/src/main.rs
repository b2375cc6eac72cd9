use anyhow::Context;
use rollcall_core::constants::KIOSK_EVENT_CHANNEL_SIZE;
use rollcall_hardware::devices::{AnyCardReader, AnyDeviceScanner};
use rollcall_hardware::scanner::ProcInputScanner;
use rollcall_hardware::wedge::{KeyboardWedgeReader, spawn_stdin_source};
use rollcall_hardware::ReaderManager;
use rollcall_kiosk::{
    AttendanceCoordinator, KioskConfig, KioskRuntime, NotificationDispatcher, banner,
    event_channel, notification_channel,
};
use rollcall_sms::SemaphoreTransport;
use rollcall_storage::{
    Database, SqliteAttendanceRepository, SqliteSmsRepository, SqliteStudentRepository,
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const READER_NAME: &str = "USB HID RFID Reader";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = KioskConfig::from_env().context("invalid kiosk configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rollcall=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        version = rollcall_core::VERSION,
        database = %config.database_path,
        "Starting attendance kiosk"
    );

    let db = Database::new(config.database_config())
        .await
        .with_context(|| format!("failed to open database {}", config.database_path))?;

    let transport = SemaphoreTransport::new(config.sms_client_config())
        .context("failed to create SMS client")?;

    let (events, mut display) = event_channel(KIOSK_EVENT_CHANNEL_SIZE);
    let printer = tokio::spawn(async move {
        while let Some(event) = display.recv().await {
            if let Some(text) = banner::render(&event) {
                println!("\n{text}");
            }
        }
    });

    let notifier_config = config.notifier_config();
    let (queue, requests) = notification_channel(notifier_config.queue_size);
    let dispatcher = Arc::new(NotificationDispatcher::new(
        transport,
        SqliteSmsRepository::new(db.pool().clone()),
        events.clone(),
        notifier_config,
    ));
    let worker = Arc::clone(&dispatcher).spawn_worker(requests);

    let coordinator = AttendanceCoordinator::new(
        SqliteStudentRepository::new(db.pool().clone()),
        SqliteAttendanceRepository::new(db.pool().clone(), config.attendance_policy()),
        events.clone(),
        config.coordinator_config(),
    )
    .with_notifications(queue);

    let reader_config = config.reader_config();
    let (reader, feeder) = KeyboardWedgeReader::new(READER_NAME, reader_config.card_timeout);
    spawn_stdin_source(feeder);

    let reader = ReaderManager::new(
        reader_config,
        AnyCardReader::Keyboard(reader),
        AnyDeviceScanner::ProcInput(ProcInputScanner::new(config.keyboard_fallback)),
    )
    .start();

    let runtime = KioskRuntime::new(coordinator, events);
    runtime
        .run(reader, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await?;

    // The coordinator owns the last queue handle; dropping it lets the
    // worker finish the notifications already queued.
    drop(runtime);
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Notification worker failed");
    }
    drop(dispatcher);
    let _ = printer.await;

    db.close().await;
    tracing::info!("Kiosk shut down");
    Ok(())
}
