//! Background feed refresh.
//!
//! A tokio task that calls [`FeedController::timer_tick`] every interval for
//! the lifetime of the process.  The first tick fires one full interval after
//! start-up (the initial load is driven by `main`).
//!
//! ## For contributors
//!
//! The task only holds a [`Weak`] reference to the controller, so it also
//! stops on its own once the controller is dropped.  An in-flight refresh is
//! abandoned, not awaited, when shutdown is requested.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::controller::FeedController;

/// Handle to the running refresh task.
pub struct RefreshTimer {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        info!("refresh timer stopped");
    }
}

/// Spawn the refresh task.
pub fn spawn(controller: Weak<FeedController>, period: Duration) -> RefreshTimer {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {}
            }

            // The controller is gone; nothing left to refresh.
            let Some(controller) = controller.upgrade() else {
                break;
            };
            debug!("refresh tick");
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = controller.timer_tick() => {}
            }
        }
    });

    RefreshTimer { shutdown, handle }
}
