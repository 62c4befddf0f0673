//! `hoard` -- local asset organizer.
//!
//! Keeps text assets in five categories and images in a separate library,
//! all in one SQLite content store.
//!
//! # Environment variables
//!
//! | Variable                       | Required | Default                      | Description                     |
//! |--------------------------------|----------|------------------------------|---------------------------------|
//! | `HOARD_DATABASE_URL`           | no       | `sqlite://hoard.db?mode=rwc` | Content store location          |
//! | `HOARD_STORE_QUOTA_BYTES`      | no       | --                           | Byte ceiling for the store      |
//! | `HOARD_DROP_COOLDOWN_MS`       | no       | `500`                        | Debounce for staged drops       |
//! | `HOARD_PICKER_COOLDOWN_MS`     | no       | `1000`                       | Debounce for direct imports     |
//! | `HOARD_RECENT_IMAGE_WINDOW_MS` | no       | `3000`                       | Repeated-image suppression      |
//! | `HOARD_MAX_IMAGE_BYTES`        | no       | `20971520`                   | Per-image size ceiling          |

use std::sync::Arc;

use clap::Parser;
use hoard_cli::commands::{run, Cli};
use hoard_cli::config::CliConfig;
use hoard_cli::render;
use hoard_db::SqliteStore;
use hoard_events::{EventBus, NoticeLevel};
use hoard_pipeline::ImportConfig;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoard_cli=info,hoard_pipeline=info,hoard_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env();
    let import_config = ImportConfig::from_env();

    let store = SqliteStore::connect(&config.database_url, config.store_quota_bytes).await?;
    tracing::debug!(database_url = %config.database_url, "Store opened");

    let bus = Arc::new(EventBus::default());
    let mut notices = bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => match notice.level {
                    NoticeLevel::Warning | NoticeLevel::Error => eprintln!("{}", render::notice(&notice)),
                    _ => tracing::debug!(event_type = %notice.event_type, message = %notice.message, "Notice"),
                },
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Dropped notices"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = run(cli, Arc::new(store), import_config, bus.clone()).await;

    // Closing the bus lets the printer drain and stop.
    drop(bus);
    let _ = printer.await;

    result
}
