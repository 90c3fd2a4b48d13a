//! Injected time source and the queue of pending debounce timers.
//!
//! The store never sleeps or spawns: hosts call [`GridStore::tick`] from
//! their own loop and due timers fire there. Tests use a
//! [`DeterministicClock`] and advance it by hand.
//!
//! [`GridStore::tick`]: crate::GridStore::tick

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use web_time::{Duration, Instant};

/// Monotonic time since an arbitrary origin.
pub trait Clock: fmt::Debug {
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct DeterministicClock {
    nanos: Arc<AtomicU64>,
}

impl DeterministicClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(by))
            });
    }

    pub fn set(&self, at: Duration) {
        let at = u64::try_from(at.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.store(at, Ordering::SeqCst);
    }
}

impl Clock for DeterministicClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Work to run when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// Hover debounce expired for the named grid.
    StayHovering { grid: String },
}

/// Pending timers ordered by deadline, then by arming order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<(Duration, TimerId), TimerTask>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, task: TimerTask) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert((deadline, id), task);
        id
    }

    /// Disarm a timer. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.pending.keys().find(|(_, pending)| *pending == id).copied();
        key.is_some_and(|key| self.pending.remove(&key).is_some())
    }

    /// Drop every timer whose task targets `grid`.
    pub fn cancel_grid(&mut self, grid: &str) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, task| !matches!(task, TimerTask::StayHovering { grid: g } if g == grid));
        before - self.pending.len()
    }

    /// Remove and return the earliest timer due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, TimerTask)> {
        let (&(deadline, id), _) = self.pending.first_key_value()?;
        if deadline > now {
            return None;
        }
        self.pending.remove(&(deadline, id)).map(|task| (id, task))
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.keys().any(|(_, pending)| *pending == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hover(grid: &str) -> TimerTask {
        TimerTask::StayHovering {
            grid: grid.to_string(),
        }
    }

    #[test]
    fn deterministic_clock_is_shared_between_clones() {
        let clock = DeterministicClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
        clock.set(Duration::from_secs(1));
        assert_eq!(handle.now(), Duration::from_secs(1));
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut queue = TimerQueue::new();
        let late = queue.schedule(Duration::from_millis(300), hover("b"));
        let early = queue.schedule(Duration::from_millis(100), hover("a"));
        assert_eq!(queue.next_deadline(), Some(Duration::from_millis(100)));
        assert!(queue.pop_due(Duration::from_millis(50)).is_none());
        assert_eq!(
            queue.pop_due(Duration::from_millis(400)),
            Some((early, hover("a")))
        );
        assert_eq!(
            queue.pop_due(Duration::from_millis(400)),
            Some((late, hover("b")))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(Duration::from_millis(10), hover("a"));
        queue.schedule(Duration::from_millis(10), hover("b"));
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(!queue.is_pending(id));
        assert_eq!(queue.cancel_grid("b"), 1);
        assert!(queue.pop_due(Duration::from_secs(1)).is_none());
    }
}
