//! Day-boundary refresh scheduler.
//!
//! Fires a refresh signal at most once per local calendar date, however long
//! the process was asleep in between. It never touches records: urgency is
//! always recomputed from `now`, so the only job here is to say "re-rank".
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Armed -> Check -> Armed ... -> Stopped
//! ```
//!
//! While running, the loop wakes at the next local midnight (plus a little
//! slack) or after `poll_interval_secs`, whichever comes first, and on every
//! [`DayBoundaryScheduler::resume`]. Each wake performs a check; a check only
//! fires when the local date is after the last fired date.
//!
//! ## Usage
//!
//! ```ignore
//! let mut scheduler = DayBoundaryScheduler::new(Arc::new(SystemClock), config, listener);
//! scheduler.start();
//! // On app foreground:
//! scheduler.resume();
//! // Teardown:
//! scheduler.stop().await;
//! ```

mod clock;
mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use tracker::{DayTracker, DayTransition};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::{Event, RefreshListener};

/// Added to the computed midnight wake so the check lands on the new date.
const MIDNIGHT_SLACK: Duration = Duration::from_secs(1);

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound between checks, in seconds. Also the fallback when the
    /// next midnight cannot be computed.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Arm a wake-up for the next local midnight.
    #[serde(default = "default_true")]
    pub align_to_midnight: bool,
}

fn default_poll_interval_secs() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            align_to_midnight: true,
        }
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

struct Shared {
    clock: Arc<dyn Clock>,
    tracker: DayTracker,
    listener: Arc<dyn RefreshListener>,
    /// Set by `stop`/drop; checks are no-ops until the next `start`.
    stopped: AtomicBool,
}

impl Shared {
    fn check(&self) -> Option<DayTransition> {
        if self.stopped.load(Ordering::Acquire) {
            debug!("scheduler stopped, ignoring check");
            return None;
        }
        let today = self.clock.today();
        match self.tracker.advance_to(today) {
            Some(transition) => {
                info!(
                    from = %transition.from,
                    to = %transition.to,
                    days = transition.days(),
                    "calendar day changed, requesting refresh"
                );
                self.listener.on_refresh_needed(&Event::DayChanged {
                    from: transition.from,
                    to: transition.to,
                    at: self.clock.now(),
                });
                Some(transition)
            }
            None => {
                debug!(%today, "day unchanged");
                None
            }
        }
    }
}

struct Running {
    wake: Arc<Notify>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owned day-boundary scheduler with an explicit `start`/`stop` lifecycle.
pub struct DayBoundaryScheduler {
    shared: Arc<Shared>,
    config: SchedulerConfig,
    running: Option<Running>,
}

impl DayBoundaryScheduler {
    /// Create an idle scheduler. The last fired date starts at today, so
    /// nothing fires until the date actually changes.
    pub fn new(
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
        listener: Arc<dyn RefreshListener>,
    ) -> Self {
        let tracker = DayTracker::new(clock.today());
        Self {
            shared: Arc::new(Shared {
                clock,
                tracker,
                listener,
                stopped: AtomicBool::new(false),
            }),
            config,
            running: None,
        }
    }

    pub fn last_fired(&self) -> NaiveDate {
        self.shared.tracker.last_fired()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Check the date now and fire if it moved. Safe to call from any thread,
    /// concurrently with the timer loop.
    pub fn check(&self) -> Option<DayTransition> {
        self.shared.check()
    }

    /// Foreground/resume hook: check immediately and re-arm the timer from
    /// the current time.
    pub fn resume(&self) -> Option<DayTransition> {
        let transition = self.shared.check();
        if let Some(running) = &self.running {
            running.wake.notify_one();
        }
        transition
    }

    /// Delay until the next scheduled wake-up.
    pub fn next_wake(&self) -> Duration {
        next_wake(self.shared.clock.as_ref(), &self.config)
    }

    /// Spawn the timer loop on the current tokio runtime. Returns `false` if
    /// it was already running.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.running.is_some() {
            return false;
        }
        self.shared.stopped.store(false, Ordering::Release);
        let wake = Arc::new(Notify::new());
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.shared),
            self.config.clone(),
            Arc::clone(&wake),
            shutdown_rx,
        ));
        info!(
            last_fired = %self.last_fired(),
            poll_interval_secs = self.config.poll_interval().as_secs(),
            "day-boundary scheduler started"
        );
        self.running = Some(Running {
            wake,
            shutdown,
            task,
        });
        true
    }

    /// Stop the timer loop and wait for it to finish. No callback fires
    /// after this returns; `check` and `resume` become no-ops until the
    /// next `start`.
    pub async fn stop(&mut self) {
        self.shared.stopped.store(true, Ordering::Release);
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.shutdown.send(());
        if let Err(e) = running.task.await {
            if !e.is_cancelled() {
                warn!(error = %e, "day-boundary scheduler task ended abnormally");
            }
        }
        info!("day-boundary scheduler stopped");
    }
}

impl Drop for DayBoundaryScheduler {
    fn drop(&mut self) {
        self.shared.stopped.store(true, Ordering::Release);
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

fn next_wake(clock: &dyn Clock, config: &SchedulerConfig) -> Duration {
    let poll = config.poll_interval();
    if !config.align_to_midnight {
        return poll;
    }
    match clock.until_next_midnight() {
        Some(until) => (until + MIDNIGHT_SLACK).min(poll),
        None => {
            warn!("cannot compute next local midnight, falling back to periodic checks");
            poll
        }
    }
}

async fn run_loop(
    shared: Arc<Shared>,
    config: SchedulerConfig,
    wake: Arc<Notify>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let wait = next_wake(shared.clock.as_ref(), &config);
        debug!(wait_ms = wait.as_millis() as u64, "armed");
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(wait) => {}
            _ = wake.notified() => continue,
        }
        shared.check();
    }
}
