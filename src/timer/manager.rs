use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{atomic::{AtomicBool, AtomicU64, Ordering}, Arc},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use parking_lot::Mutex;
use tracing::{debug, error, info};
use crate::{environment::config::Settings, errors::{Result, RuntimeError}};
use super::{Schedule, TimerBody, DEFAULT_TICK_MS};

/// State reachable from the worker thread and from every [`super::Timer`].
///
/// Lock order is always `schedule` before a timer's own `state`.
pub(crate) struct Shared {
    schedule: Mutex<Schedule>,
    tick: Duration,
    terminate: AtomicBool,
    wakes: AtomicU64,
}

impl Shared {
    pub(crate) fn arm(&self, body: &Arc<TimerBody>, deadline: Instant) -> Result<()> {
        let mut schedule = self.schedule.lock();
        let mut state = body.state.lock();
        if state.key.is_some() {
            return Err(RuntimeError::PreconditionViolation(
                format!("timer {} is already armed", body.id)
            ));
        }

        schedule.seq += 1;
        let key = (deadline, schedule.seq);
        schedule.timers.insert(key, body.clone());
        state.key = Some(key);
        Ok(())
    }

    /// Returns whether the timer was armed.
    pub(crate) fn disarm(&self, body: &TimerBody) -> bool {
        let mut schedule = self.schedule.lock();
        let mut state = body.state.lock();
        state.epoch += 1;
        match state.key.take() {
            Some(key) => {
                // The owner still holds the body, so this never drops it
                // under the locks.
                schedule.timers.remove(&key);
                true
            },
            None => false,
        }
    }

    // Pop the earliest timer due at `poll`, marking it idle.
    fn take_due(&self, poll: Instant) -> Option<(Arc<TimerBody>, u64)> {
        let mut schedule = self.schedule.lock();
        let (&(deadline, _), _) = schedule.timers.first_key_value()?;
        if deadline > poll {
            return None;
        }

        let (_, body) = schedule.timers.pop_first()?;
        let epoch = {
            let mut state = body.state.lock();
            state.key = None;
            state.epoch
        };
        Some((body, epoch))
    }

    fn fire(&self, body: &TimerBody, epoch: u64) {
        if body.state.lock().epoch != epoch {
            debug!(timer = %body.id, "timer stopped before dispatch");
            return;
        }

        match catch_unwind(AssertUnwindSafe(|| (body.callback)())) {
            Ok(Ok(())) => {},
            Ok(Err(err)) => error!(timer = %body.id, error = %err, "timer callback failed"),
            Err(panic) => error!(timer = %body.id, panic = panic_message(panic.as_ref()), "timer callback panicked"),
        }
    }

    fn run(&self) {
        info!(tick = ?self.tick, "timer thread running");
        let mut next_poll = Instant::now();
        while !self.terminate.load(Ordering::Acquire) {
            self.wakes.fetch_add(1, Ordering::AcqRel);
            while !self.terminate.load(Ordering::Acquire) {
                let Some((body, epoch)) = self.take_due(next_poll) else {
                    break;
                };
                self.fire(&body, epoch);
            }

            // Fixed cadence: sleep to the next poll boundary, not tick from now.
            next_poll += self.tick;
            let now = Instant::now();
            if next_poll > now {
                thread::sleep(next_poll - now);
            }
        }
        info!("timer thread stopping");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        return msg;
    }
    match panic.downcast_ref::<String>() {
        Some(msg) => msg.as_str(),
        None => "unknown panic",
    }
}

/// Deadline ordered scheduler running on one dedicated thread.
///
/// Every due timer is fired in the same wake in increasing deadline order,
/// equal deadlines in the order they were armed.
pub struct TimerManager {
    pub(crate) shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl TimerManager {
    pub fn new(tick: Duration) -> Self {
        let shared = Shared {
            schedule: Mutex::new(Schedule::default()),
            tick,
            terminate: AtomicBool::new(false),
            wakes: AtomicU64::new(0),
        };
        Self {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Build from the `tick` setting (milliseconds, default 100).
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let tick = settings.int_value("tick", DEFAULT_TICK_MS)?;
        if tick <= 0 {
            return Err(RuntimeError::InvalidConfig(format!("tick must be positive, got {}", tick)));
        }
        info!("set timer tick to {}ms", tick);
        Ok(Self::new(Duration::from_millis(tick as u64)))
    }

    /// Spawn the worker thread. Can only be done once.
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::PreconditionViolation(
                String::from("timer manager already started")
            ));
        }

        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name("timer-manager".into())
            .spawn(move || shared.run())
            .map_err(|err| {
                self.started.store(false, Ordering::Release);
                RuntimeError::PreconditionViolation(format!("cannot spawn timer thread: {}", err))
            })?;
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Ask the worker to stop and wait for it, unless called from a timer
    /// callback. Takes effect within one tick; a running callback is never
    /// interrupted.
    pub fn terminate(&self) {
        self.shared.terminate.store(true, Ordering::Release);
        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            error!("timer thread ended with a panic");
        }
    }

    pub fn tick(&self) -> Duration {
        self.shared.tick
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.shared.terminate.load(Ordering::Acquire)
    }

    /// Number of timers currently armed.
    pub fn armed_count(&self) -> usize {
        self.shared.schedule.lock().timers.len()
    }

    /// Number of worker wake-ups so far, for diagnostics.
    pub fn wakes(&self) -> u64 {
        self.shared.wakes.load(Ordering::Acquire)
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use crate::{environment::config::Settings, errors::RuntimeError};
    use super::TimerManager;

    #[test]
    fn tick_from_settings() {
        let manager = TimerManager::from_settings(&Settings::new()).unwrap();
        assert_eq!(manager.tick(), Duration::from_millis(100));

        let manager = TimerManager::from_settings(&Settings::new().with("tick", "25")).unwrap();
        assert_eq!(manager.tick(), Duration::from_millis(25));

        let res = TimerManager::from_settings(&Settings::new().with("tick", "fast"));
        assert!(matches!(res, Err(RuntimeError::InvalidConfig(_))));

        let res = TimerManager::from_settings(&Settings::new().with("tick", "0"));
        assert!(matches!(res, Err(RuntimeError::InvalidConfig(_))));
    }

    #[test]
    fn start_once_terminate_twice() {
        let manager = TimerManager::new(Duration::from_millis(5));
        assert!(!manager.is_running());
        manager.start().unwrap();
        assert!(manager.is_running());
        assert!(matches!(manager.start(), Err(RuntimeError::PreconditionViolation(_))));

        manager.terminate();
        manager.terminate();
        assert!(!manager.is_running());
    }
}
