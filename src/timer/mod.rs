use std::{collections::BTreeMap, sync::Arc, time::Instant};
use parking_lot::Mutex;
use crate::errors::Result;

pub mod manager;
pub mod timer;

pub use manager::TimerManager;
pub use timer::Timer;

pub const DEFAULT_TICK_MS: i64 = 100;

/// Work run on the scheduler thread when a timer expires.
pub type Callback = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Position in the schedule. The sequence number breaks ties between equal
/// deadlines in arming order.
pub(crate) type Key = (Instant, u64);

#[derive(Default)]
pub(crate) struct TimerState {
    pub(crate) key: Option<Key>,
    /// Bumped on every stop. A callback dequeued under an older epoch is
    /// skipped.
    pub(crate) epoch: u64,
}

/// Reference counted timer body shared by the owning [`Timer`] and the
/// schedule.
pub(crate) struct TimerBody {
    pub(crate) id: String,
    pub(crate) callback: Callback,
    pub(crate) state: Mutex<TimerState>,
}

#[derive(Default)]
pub(crate) struct Schedule {
    pub(crate) timers: BTreeMap<Key, Arc<TimerBody>>,
    pub(crate) seq: u64,
}
