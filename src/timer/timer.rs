use std::{sync::Arc, time::{Duration, Instant}};
use parking_lot::Mutex;
use tracing::{debug, error};
use crate::errors::Result;
use super::{manager::Shared, TimerBody, TimerManager, TimerState};

/// Cancellable single shot deadline.
///
/// A timer is idle until [`Timer::start`] arms it; it becomes idle again
/// when it fires or on [`Timer::stop`]. The callback runs on the manager's
/// worker thread with no lock held, so it may re-arm or stop its own timer.
/// Dropping the timer disarms it.
pub struct Timer {
    body: Arc<TimerBody>,
    shared: Arc<Shared>,
    duration: Duration,
}

impl Timer {
    pub fn new<F>(manager: &TimerManager, id: impl Into<String>, duration: Duration, callback: F) -> Self
    where F: Fn() -> Result<()> + Send + Sync + 'static
    {
        let body = TimerBody {
            id: id.into(),
            callback: Arc::new(callback),
            state: Mutex::new(TimerState::default()),
        };
        Self {
            body: Arc::new(body),
            shared: manager.shared.clone(),
            duration,
        }
    }

    pub fn id(&self) -> &str {
        &self.body.id
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Arm with the configured duration.
    pub fn start(&self) -> Result<()> {
        self.start_with(self.duration)
    }

    pub fn start_with(&self, duration: Duration) -> Result<()> {
        self.start_at(Instant::now() + duration)
    }

    /// Arm for an absolute deadline.
    ///
    /// Arming an armed timer is a programming error: it is logged and
    /// rejected with `PreconditionViolation`, leaving the schedule untouched.
    pub fn start_at(&self, deadline: Instant) -> Result<()> {
        match self.shared.arm(&self.body, deadline) {
            Ok(()) => {
                debug!(timer = %self.body.id, "start timer");
                Ok(())
            },
            Err(err) => {
                error!(timer = %self.body.id, error = %err, "start timer rejected");
                Err(err)
            },
        }
    }

    /// Disarm. No-op when idle.
    pub fn stop(&self) {
        if self.shared.disarm(&self.body) {
            debug!(timer = %self.body.id, "stop timer");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.body.state.lock().key.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.body.state.lock().key.map(|(deadline, _)| deadline)
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.shared.disarm(&self.body);
    }
}
