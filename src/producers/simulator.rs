//! Live detection simulator.
//!
//! Stands in for the in-store cameras: while recording it synthesizes one
//! detection after every jittered delay and pushes it into the store.

use crate::events::{Category, DetectionEvent, SharedEventStore, ValidationError, Zone};
use crate::notify::{Notification, Notifier};
use crate::producers::scheduler::{lock, PeriodicTask, Schedule, TaskSlot};
use crate::transparency::SharedSessionLog;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Lowest confidence a synthesized detection carries.
pub const MIN_SYNTHETIC_CONFIDENCE: u8 = 70;
/// Highest confidence a synthesized detection carries.
pub const MAX_SYNTHETIC_CONFIDENCE: u8 = 100;

/// Default delay bounds between live detections, in milliseconds.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 5_000;

/// Recording state of the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    Recording,
}

/// Draw a confidence in the synthetic range.
pub fn synthetic_confidence<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(MIN_SYNTHETIC_CONFIDENCE..=MAX_SYNTHETIC_CONFIDENCE)
}

/// Synthesize one live detection.
pub fn synthesize_detection<R: Rng + ?Sized>(rng: &mut R) -> Result<DetectionEvent, ValidationError> {
    let category = *Category::ALL.choose(rng).unwrap_or(&Category::Neutral);
    let location = *Zone::in_store().choose(rng).unwrap_or(&Zone::EntryDoor);
    DetectionEvent::live(category, location, synthetic_confidence(rng))
}

/// Jittered producer of live detections.
pub struct LiveSimulator {
    store: SharedEventStore,
    notifier: Notifier,
    log: SharedSessionLog,
    schedule: Schedule,
    seeds: Mutex<StdRng>,
    latest: Arc<Mutex<Option<DetectionEvent>>>,
    detections: Arc<AtomicU64>,
    task: TaskSlot,
}

impl LiveSimulator {
    pub fn new(
        store: SharedEventStore,
        notifier: Notifier,
        log: SharedSessionLog,
        schedule: Schedule,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            notifier,
            log,
            schedule,
            seeds: Mutex::new(rng),
            latest: Arc::new(Mutex::new(None)),
            detections: Arc::new(AtomicU64::new(0)),
            task: TaskSlot::new(),
        }
    }

    /// Begin recording. Does nothing when already recording.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let seed: u64 = lock(&self.seeds).gen();
        let armed = self.task.arm(|| {
            let store = self.store.clone();
            let notifier = self.notifier.clone();
            let log = self.log.clone();
            let latest = self.latest.clone();
            let detections = self.detections.clone();

            PeriodicTask::spawn(
                "live-simulator",
                self.schedule,
                StdRng::seed_from_u64(seed),
                move |rng| match synthesize_detection(rng) {
                    Ok(event) => {
                        tracing::debug!(
                            category = %event.category(),
                            location = %event.location(),
                            confidence = event.confidence(),
                            "Live detection"
                        );
                        if store.push(event.clone()).is_some() {
                            log.record_eviction();
                        }
                        log.record_live_detection();
                        detections.fetch_add(1, Ordering::Relaxed);
                        *lock(&latest) = Some(event.clone());
                        notifier.notify(Notification::LatestDetection { event });
                    }
                    Err(e) => tracing::warn!("Discarding synthesized detection: {e}"),
                },
            )
        });

        if armed {
            tracing::info!("Recording started");
            self.notifier.notify(Notification::RecordingStarted);
        }
        armed
    }

    /// Stop recording. Does nothing when idle.
    pub fn stop(&self) -> bool {
        let disarmed = self.task.disarm();
        if disarmed {
            tracing::info!("Recording stopped");
            self.notifier.notify(Notification::RecordingStopped);
        }
        disarmed
    }

    pub fn state(&self) -> SimulatorState {
        if self.task.is_armed() {
            SimulatorState::Recording
        } else {
            SimulatorState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state() == SimulatorState::Recording
    }

    /// Most recent live detection, for the "current detection" display.
    pub fn latest(&self) -> Option<DetectionEvent> {
        lock(&self.latest).clone()
    }

    /// Live detections produced since the simulator was created.
    ///
    /// Survives stop and restart.
    pub fn detections(&self) -> u64 {
        self.detections.load(Ordering::Relaxed)
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{create_shared_store, Source};
    use crate::notify::channel;
    use crate::transparency::create_shared_log;
    use std::time::Duration;

    fn simulator(
        schedule: Schedule,
    ) -> (
        LiveSimulator,
        SharedEventStore,
        crossbeam_channel::Receiver<Notification>,
    ) {
        let store = create_shared_store(100);
        let (notifier, receiver) = channel();
        let sim = LiveSimulator::new(
            store.clone(),
            notifier,
            create_shared_log(),
            schedule,
            StdRng::seed_from_u64(11),
        );
        (sim, store, receiver)
    }

    fn default_schedule() -> Schedule {
        Schedule::jittered_ms(DEFAULT_MIN_INTERVAL_MS, DEFAULT_MAX_INTERVAL_MS)
    }

    #[test]
    fn test_synthesized_events_are_live_and_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..500 {
            let event = synthesize_detection(&mut rng).unwrap();
            assert_eq!(event.source(), Source::Live);
            assert!(!event.location().is_upload());
            assert!((70..=100).contains(&event.confidence()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_until_started() {
        let (sim, store, _rx) = simulator(default_schedule());
        assert_eq!(sim.state(), SimulatorState::Idle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_arms_one_timer() {
        // A window narrower than twice its minimum lets one timer fire only once
        let (sim, store, rx) = simulator(Schedule::jittered_ms(3_000, 5_000));
        assert!(sim.start());
        assert!(!sim.start());

        tokio::time::sleep(Duration::from_millis(2_999)).await;
        assert_eq!(store.len(), 0);

        tokio::time::sleep(Duration::from_millis(2_002)).await;
        assert_eq!(store.len(), 1);

        let started = rx
            .try_iter()
            .filter(|n| *n == Notification::RecordingStarted)
            .count();
        assert_eq!(started, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_production() {
        let (sim, store, rx) = simulator(default_schedule());
        sim.start();
        tokio::time::sleep(Duration::from_millis(20_001)).await;

        let produced = store.len();
        // At most one per 2 s, at least one per 5 s
        assert!((4..=10).contains(&produced));
        assert_eq!(sim.detections(), produced as u64);
        assert_eq!(sim.latest().unwrap().id(), store.latest().unwrap().id());

        assert!(sim.stop());
        assert!(!sim.stop());
        assert_eq!(sim.state(), SimulatorState::Idle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.len(), produced);
        assert_eq!(sim.detections(), produced as u64);

        let notes: Vec<Notification> = rx.try_iter().collect();
        assert_eq!(notes.first(), Some(&Notification::RecordingStarted));
        assert_eq!(notes.last(), Some(&Notification::RecordingStopped));
        let detections = notes
            .iter()
            .filter(|n| matches!(n, Notification::LatestDetection { .. }))
            .count();
        assert_eq!(detections, produced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let (sim, store, _rx) = simulator(Schedule::jittered_ms(3_000, 5_000));
        sim.start();
        sim.stop();
        assert!(sim.start());

        tokio::time::sleep(Duration::from_millis(5_001)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(sim.detections(), 1);

        // The count carries over a stop and restart
        sim.stop();
        sim.start();
        tokio::time::sleep(Duration::from_millis(5_001)).await;
        assert_eq!(store.len(), 2);
        assert_eq!(sim.detections(), 2);
    }
}
