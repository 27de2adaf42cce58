//! Periodic post generation.
//!
//! One background task ticks every `period`; the first tick fires one full
//! period after arming. Each tick reseeds a post from a random feed. A failed
//! tick is logged and the schedule continues.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, instrument};

use sanstha_shared::{Result, SansthaError};

use crate::generator::PostGenerator;

/// Default interval between ticks.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Stops the schedule when stopped or dropped.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    armed_flag: Option<Arc<AtomicBool>>,
}

impl SchedulerHandle {
    /// Whether the background task is still running.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal shutdown and wait for the task to exit.
    ///
    /// An in-flight tick is allowed to finish; no further ticks start.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "scheduler task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }

    /// Clear `flag` once this handle goes away.
    pub(crate) fn with_armed_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.armed_flag = Some(flag);
        self
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(flag) = &self.armed_flag {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

/// Start ticking `generator.generate_from_feeds()` every `period`.
///
/// Must be called from within a tokio runtime.
#[instrument(skip_all, fields(period_secs = period.as_secs()))]
pub fn arm(generator: Arc<PostGenerator>, period: Duration) -> Result<SchedulerHandle> {
    if period.is_zero() {
        return Err(SansthaError::validation("scheduler period must be positive"));
    }

    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match generator.generate_from_feeds().await {
                        Ok(post) => info!(id = %post.id, title = %post.title, "scheduled post created"),
                        Err(e) => error!(error = %e, "scheduled generation failed"),
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    info!("scheduler armed");
    Ok(SchedulerHandle {
        stop_tx,
        task: Some(task),
        armed_flag: None,
    })
}
