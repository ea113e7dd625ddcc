//! Inbound update loop
//!
//! Runs beside the publishing scheduler for the lifetime of the process. The
//! bot has no commands, so updates are acknowledged (by advancing the offset)
//! and logged.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::client::{TelegramClient, Update};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Offset to request next so that Telegram drops everything in `updates`.
#[must_use]
pub fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .max(current)
}

/// Polls `getUpdates` until `shutdown` flips to `true`. Errors are logged and
/// followed by a short pause; they never end the loop.
pub async fn run_update_loop(client: &TelegramClient, mut shutdown: watch::Receiver<bool>) {
    info!("Starting Telegram update loop");
    let mut offset: Option<i64> = None;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let poll = tokio::select! {
            result = client.get_updates(offset) => result,
            _ = shutdown.changed() => break,
        };

        match poll {
            Ok(updates) => {
                for update in &updates {
                    debug!(
                        "Received update {} ({})",
                        update.update_id,
                        update.kind()
                    );
                }
                offset = next_offset(offset, &updates);
            }
            Err(e) => {
                warn!("Polling Telegram updates failed: {}", e);
                tokio::select! {
                    () = tokio::time::sleep(ERROR_BACKOFF) => {}
                    _ = shutdown.changed() => break,
                }
            }
        }
    }

    info!("Telegram update loop stopped");
}
