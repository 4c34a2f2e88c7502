use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures_util::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Maximum gap since the last input event for a second to be counted as active
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(60);

/// Period of the active time ticks
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Lifecycle of an [ActivityTracker]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ActivityStatus {
    /// Created, but not started yet
    Idle,
    /// Counting active seconds
    Tracking,
    /// Stopped, it can't be started again
    Stopped,
}

/// State shared between the tick loop, the input listener and the readers
#[derive(Debug)]
struct ActivityState {
    status: Mutex<ActivityStatus>,
    active_seconds: AtomicU64,
    last_event: Mutex<Option<Instant>>,
}

/// Tracks the seconds in which the user has been active, this is, with some input event in the last
/// [IDLE_THRESHOLD].
///
/// Cloning the tracker returns a handle to the same state.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    state: Arc<ActivityState>,
    cancellation_token: CancellationToken,
}

impl ActivityTracker {
    /// Creates a new idle tracker, that will stop when the given token is cancelled
    pub fn new(cancellation_token: &CancellationToken) -> Self {
        Self {
            state: Arc::new(ActivityState {
                status: Mutex::new(ActivityStatus::Idle),
                active_seconds: AtomicU64::new(0),
                last_event: Mutex::new(None),
            }),
            cancellation_token: cancellation_token.child_token(),
        }
    }

    /// Current status of the tracker
    pub fn status(&self) -> ActivityStatus {
        *self.state.status.lock()
    }

    /// Seconds counted as active so far
    pub fn active_seconds(&self) -> u64 {
        self.state.active_seconds.load(Ordering::Relaxed)
    }

    /// Starts counting active seconds on a background task.
    ///
    /// Returns `false` if the tracker was already started or has been stopped, in which case nothing is done.
    pub fn start(&self) -> bool {
        {
            let mut status = self.state.status.lock();
            if *status != ActivityStatus::Idle {
                tracing::debug!("Activity tracker is {status}, skipping start");
                return false;
            }
            *status = ActivityStatus::Tracking;
        }
        tracing::info!("Activity tracking started");

        let state = self.state.clone();
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    now = interval.tick() => state.tick(now),
                }
            }
            tracing::debug!("Activity tick loop finished");
        });
        true
    }

    /// Listens to the given stream on a background task, every item is an input event.
    ///
    /// The listener finishes when the stream ends or the tracker is stopped.
    pub fn listen<S>(&self, events: S)
    where
        S: Stream + Send + 'static,
        S::Item: Send,
    {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut events = std::pin::pin!(events);
            loop {
                tokio::select! {
                    biased;
                    _ = tracker.cancellation_token.cancelled() => break,
                    event = events.next() => match event {
                        Some(_) => tracker.record_event(),
                        None => break,
                    },
                }
            }
            tracing::debug!("Activity listener finished");
        });
    }

    /// Records an input event at the current instant
    pub fn record_event(&self) {
        *self.state.last_event.lock() = Some(Instant::now());
    }

    /// Stops the tracker, returning the final active seconds
    pub fn stop(&self) -> u64 {
        *self.state.status.lock() = ActivityStatus::Stopped;
        self.cancellation_token.cancel();
        let total = self.active_seconds();
        tracing::info!("Activity tracking stopped with {total} active seconds");
        total
    }
}

impl ActivityState {
    /// Counts a second as active if the last event is recent enough
    fn tick(&self, now: Instant) {
        if *self.status.lock() != ActivityStatus::Tracking {
            return;
        }
        let last_event = *self.last_event.lock();
        if let Some(last_event) = last_event
            && now.saturating_duration_since(last_event) < IDLE_THRESHOLD
        {
            self.active_seconds.fetch_add(1, Ordering::Relaxed);
        }
    }
}
