use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::Poller;

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub paused: bool,
    pub interval_secs: u64,
}

/// Owns the single recurring poll job.
///
/// `start` spawns the job (first pass immediately, then every `interval`);
/// `stop` signals it and waits for an in-flight pass to finish. While paused
/// the job keeps ticking but skips its passes.
pub struct Scheduler {
    poller: Arc<Poller>,
    interval: Duration,
    paused: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(poller: Arc<Poller>, interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Scheduler {
            poller,
            interval,
            paused: Arc::new(AtomicBool::new(false)),
            shutdown,
            handle: Mutex::new(None),
        }
    }

    /// Spawn the poll job. Returns `false` if it is already running.
    pub fn start(&self) -> bool {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!("Scheduler already running");
            return false;
        }

        self.shutdown.send_replace(false);
        let mut shutdown = self.shutdown.subscribe();
        let poller = Arc::clone(&self.poller);
        let paused = Arc::clone(&self.paused);
        let period = self.interval;

        *handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if paused.load(Ordering::SeqCst) {
                            debug!("Scheduler paused, skipping poll");
                            continue;
                        }
                        poller.poll_all_active_games().await;
                    }
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Poll job stopped");
        }));

        info!("Scheduler started (interval={:?})", self.interval);
        true
    }

    /// Signal the job to exit and wait for it.
    pub async fn stop(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        self.shutdown.send_replace(true);
        if let Err(e) = handle.await {
            error!("Poll job ended abnormally: {}", e);
        }
        info!("Scheduler stopped");
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("Scheduler paused");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        info!("Scheduler resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Whether the job is alive and not paused.
    pub fn is_running(&self) -> bool {
        let alive = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished());
        alive && !self.is_paused()
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            paused: self.is_paused(),
            interval_secs: self.interval.as_secs(),
        }
    }
}
