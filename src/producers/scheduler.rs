//! Periodic task scheduling for the simulated producers.
//!
//! Every timer in the crate is a [`PeriodicTask`]: a tokio task that sleeps
//! for a delay drawn from its [`Schedule`], runs one tick, and repeats.
//! Dropping the task disarms it. Under tokio's paused test clock the whole
//! schedule runs on virtual time.

use rand::rngs::StdRng;
use rand::Rng;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long to wait before each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Same delay every time.
    Fixed(Duration),
    /// Delay redrawn uniformly from `[min, max]` before every tick.
    Jittered { min: Duration, max: Duration },
}

impl Schedule {
    /// Jittered schedule from millisecond bounds; swapped bounds are reordered.
    pub fn jittered_ms(min_ms: u64, max_ms: u64) -> Self {
        Schedule::Jittered {
            min: Duration::from_millis(min_ms.min(max_ms)),
            max: Duration::from_millis(min_ms.max(max_ms)),
        }
    }

    /// Draw the delay before the next tick.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Schedule::Fixed(period) => period,
            Schedule::Jittered { min, max } if min >= max => min,
            Schedule::Jittered { min, max } => {
                let millis = rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64);
                Duration::from_millis(millis)
            }
        }
    }

    /// Shortest delay this schedule can produce.
    pub fn min_delay(&self) -> Duration {
        match *self {
            Schedule::Fixed(period) => period,
            Schedule::Jittered { min, .. } => min,
        }
    }

    /// Longest delay this schedule can produce.
    pub fn max_delay(&self) -> Duration {
        match *self {
            Schedule::Fixed(period) => period,
            Schedule::Jittered { min, max } => min.max(max),
        }
    }
}

/// A running timer. Aborted when dropped.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn a timer on the current tokio runtime.
    ///
    /// `tick` receives the task's own random source so each tick can draw
    /// from it. Panics if called outside a runtime.
    pub fn spawn<F>(name: &'static str, schedule: Schedule, mut rng: StdRng, mut tick: F) -> Self
    where
        F: FnMut(&mut StdRng) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                let delay = schedule.next_delay(&mut rng);
                tokio::time::sleep(delay).await;
                tick(&mut rng);
            }
        });
        tracing::debug!(task = name, ?schedule, "Timer armed");

        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!(task = self.name, "Timer disarmed");
    }
}

/// Holds at most one armed timer.
///
/// Arming an occupied slot or disarming an empty one does nothing, which
/// makes start/stop idempotent for every component built on it.
#[derive(Debug, Default)]
pub struct TaskSlot {
    task: Mutex<Option<PeriodicTask>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot with the task built by `spawn`, unless already armed.
    ///
    /// Returns whether a new timer was armed.
    pub fn arm<F>(&self, spawn: F) -> bool
    where
        F: FnOnce() -> PeriodicTask,
    {
        let mut task = lock(&self.task);
        if task.is_some() {
            return false;
        }
        *task = Some(spawn());
        true
    }

    /// Disarm the slot. Returns whether a timer was running.
    pub fn disarm(&self) -> bool {
        lock(&self.task).take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.task).is_some()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Every critical section in the crate is a single assignment or copy, so
/// a poisoned value is never half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_jittered_delay_within_bounds() {
        let schedule = Schedule::jittered_ms(2_000, 5_000);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            let delay = schedule.next_delay(&mut rng);
            assert!(delay >= Duration::from_millis(2_000));
            assert!(delay <= Duration::from_millis(5_000));
        }
    }

    #[test]
    fn test_swapped_and_degenerate_bounds() {
        let schedule = Schedule::jittered_ms(5_000, 2_000);
        assert_eq!(schedule.min_delay(), Duration::from_millis(2_000));
        assert_eq!(schedule.max_delay(), Duration::from_millis(5_000));

        let mut rng = StdRng::seed_from_u64(1);
        let fixed = Schedule::jittered_ms(300, 300);
        assert_eq!(fixed.next_delay(&mut rng), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_task_ticks_on_virtual_time() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();
        let task = PeriodicTask::spawn(
            "test",
            Schedule::Fixed(Duration::from_secs(5)),
            StdRng::seed_from_u64(0),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_millis(14_900)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        drop(task);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_arms_once() {
        let slot = TaskSlot::new();
        let spawn = || {
            PeriodicTask::spawn(
                "slot",
                Schedule::Fixed(Duration::from_secs(1)),
                StdRng::seed_from_u64(0),
                |_| {},
            )
        };

        assert!(slot.arm(spawn));
        assert!(!slot.arm(spawn));
        assert!(slot.is_armed());
        assert!(slot.disarm());
        assert!(!slot.disarm());
        assert!(!slot.is_armed());
    }
}
