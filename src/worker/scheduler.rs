//! Fixed-cadence trigger for publish attempts.
//!
//! The first attempt runs immediately, then one per period. Attempts never
//! overlap: the loop waits for the running attempt before looking at the
//! ticker, and ticks missed meanwhile collapse into a single catch-up attempt
//! (`MissedTickBehavior::Skip`), after which the regular cadence resumes.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::publish::Publisher;
use crate::core::models::{AbortStage, PublishOutcome};

/// Anything the scheduler can trigger once per tick.
#[async_trait]
pub trait PublishJob: Send + Sync {
    async fn run_attempt(&self) -> PublishOutcome;
}

#[async_trait]
impl PublishJob for Publisher {
    async fn run_attempt(&self) -> PublishOutcome {
        Publisher::run_attempt(self).await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs one attempt, turning a panic anywhere inside it into an aborted
/// outcome so the loop keeps going.
async fn contained_attempt(job: &dyn PublishJob, attempt: u64) -> PublishOutcome {
    match AssertUnwindSafe(job.run_attempt()).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Attempt {} panicked: {}", attempt, message);
            PublishOutcome::Aborted {
                stage: AbortStage::Panicked,
                error: message,
            }
        }
    }
}

fn log_outcome(attempt: u64, outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::WithImage => info!("Attempt {} published a photo post", attempt),
        PublishOutcome::TextOnly(reason) => {
            info!("Attempt {} published a text post ({:?})", attempt, reason);
        }
        PublishOutcome::Aborted { stage, error } => {
            warn!(
                "Attempt {} published nothing (stage={}): {}",
                attempt, stage, error
            );
        }
    }
}

/// Runs `job` every `period` until `shutdown` becomes `true` (or its sender is
/// dropped). Returns the number of attempts started.
pub async fn run_scheduler(
    job: Arc<dyn PublishJob>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    if period.is_zero() {
        error!("Publish interval must be greater than zero; scheduler not started");
        return 0;
    }

    info!("Scheduler started, publishing every {}s", period.as_secs());
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut attempts: u64 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        attempts += 1;
        let outcome = tokio::select! {
            outcome = contained_attempt(job.as_ref(), attempts) => outcome,
            _ = shutdown.changed() => {
                warn!("Shutdown requested during attempt {}", attempts);
                break;
            }
        };
        log_outcome(attempts, &outcome);
    }

    info!("Scheduler stopped after {} attempts", attempts);
    attempts
}
