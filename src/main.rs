mod bot;
mod card;
mod command;
mod config;
mod matrix;
mod psygpt;

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use config::Config;
use matrix::MatrixClient;
use psygpt::PsyGptClient;

/// Long-poll timeout for the sync loop.
const SYNC_TIMEOUT_MS: u64 = 30_000;

/// Pause before retrying after a failed sync.
const SYNC_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let _guard = init_logging(config.log_dir.as_deref());

    info!("🚀 Starting PsyAI bot...");

    // Login failure is fatal; everything after this point keeps the loop alive.
    let client = match MatrixClient::login(&config.homeserver, &config.user_id, &config.password)
        .await
    {
        Ok(client) => client,
        Err(e) => panic!("Matrix login failed: {e}"),
    };

    let psygpt = PsyGptClient::new(
        config.base_url,
        config.api_key,
        config.bearer_token,
        config.model_id,
        config.info_prompt_suffix,
    );

    run(&client, &psygpt).await;
}

/// The receive loop. Runs until the process is terminated externally.
async fn run(client: &MatrixClient, psygpt: &PsyGptClient) {
    // Initial sync establishes a since-token so history from before startup
    // is not replayed.
    let mut since = match client.sync(None, 0).await {
        Ok(batch) => Some(batch.next_batch),
        Err(e) => {
            warn!("Initial sync failed: {e}");
            None
        }
    };

    loop {
        let batch = match client.sync(since.as_deref(), SYNC_TIMEOUT_MS).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Sync error: {e}");
                tokio::time::sleep(SYNC_RETRY_DELAY).await;
                continue;
            }
        };
        since = Some(batch.next_batch);

        for message in batch.messages {
            if message.sender == client.user_id() {
                continue;
            }

            if let Some(reply) = bot::respond(&message.body, psygpt).await {
                info!("📨 Replying in {} to {}", message.room_id, message.sender);
                if let Err(e) = client.send_text(&message.room_id, &reply).await {
                    warn!("Failed to send reply: {e}");
                }
            }
        }
    }
}

fn init_logging(log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::INFO.into()),
            ),
    );

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok();
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("psyai.log"))
                .expect("Failed to open log file");
            let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_filter(
                            tracing_subscriber::EnvFilter::from_default_env()
                                .add_directive(tracing::Level::INFO.into()),
                        ),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}
