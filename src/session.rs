//! One dashboard session: the event store plus every producer and view.
//!
//! The store owns the raw events. The histogram and rolling stats are
//! separate value holders, each written only by its own timer; readers
//! always receive copies.

use crate::config::{Config, ConfigError};
use crate::core::{
    ConfidenceSummary, ExportError, ExportFormat, Exporter, HistogramState, RecordQuery,
    RollingStatsEstimator, RollingStatsSnapshot,
};
use crate::events::{create_shared_store, DetectionEvent, SharedEventStore};
use crate::notify::{self, Notification, Notifier};
use crate::producers::scheduler::lock;
use crate::producers::{
    LiveSimulator, MediaItem, PeriodicTask, Schedule, SimulatorState, TaskSlot, UploadClassifier,
    UploadError,
};
use crate::transparency::{create_shared_log, SharedSessionLog};
use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// The ingestion and aggregation core of one dashboard.
pub struct DashboardSession {
    config: Config,
    store: SharedEventStore,
    log: SharedSessionLog,
    notifier: Notifier,
    simulator: LiveSimulator,
    classifier: UploadClassifier,
    histogram: Arc<Mutex<HistogramState>>,
    stats: Arc<Mutex<RollingStatsSnapshot>>,
    estimator: RollingStatsEstimator,
    histogram_task: TaskSlot,
    stats_task: TaskSlot,
    seeds: Mutex<StdRng>,
    exporter: Exporter,
}

impl DashboardSession {
    /// Build a session and the receiver its notifications arrive on.
    pub fn new(config: Config) -> Result<(Self, Receiver<Notification>), ConfigError> {
        Self::with_log(config, create_shared_log())
    }

    /// Build a session that reports into an existing log.
    pub fn with_log(
        config: Config,
        log: SharedSessionLog,
    ) -> Result<(Self, Receiver<Notification>), ConfigError> {
        config.validate()?;
        let exporter = Exporter::new(config.tz()?);

        let mut seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let store = create_shared_store(config.store_capacity);
        let (notifier, receiver) = notify::channel();

        let simulator = LiveSimulator::new(
            store.clone(),
            notifier.clone(),
            log.clone(),
            config.live_schedule(),
            StdRng::seed_from_u64(seeds.gen()),
        );
        let classifier = UploadClassifier::new(
            store.clone(),
            notifier.clone(),
            log.clone(),
            StdRng::seed_from_u64(seeds.gen()),
        )
        .with_delays(config.image_delay, config.video_delay);

        let session = Self {
            estimator: RollingStatsEstimator::new(config.dwell_baseline),
            config,
            store,
            log,
            notifier,
            simulator,
            classifier,
            histogram: Arc::new(Mutex::new(HistogramState::default())),
            stats: Arc::new(Mutex::new(RollingStatsSnapshot::default())),
            histogram_task: TaskSlot::new(),
            stats_task: TaskSlot::new(),
            seeds: Mutex::new(seeds),
            exporter,
        };

        Ok((session, receiver))
    }

    /// Start the live simulator and the histogram and stats timers.
    ///
    /// Returns false when already recording. Must be called from within a
    /// tokio runtime.
    pub fn start_recording(&self) -> bool {
        let (histogram_seed, stats_seed) = {
            let mut seeds = lock(&self.seeds);
            (seeds.gen::<u64>(), seeds.gen::<u64>())
        };

        self.histogram_task.arm(|| {
            let histogram = self.histogram.clone();
            let log = self.log.clone();
            PeriodicTask::spawn(
                "histogram",
                Schedule::Fixed(self.config.histogram_interval),
                StdRng::seed_from_u64(histogram_seed),
                move |rng| {
                    let prev = lock(&histogram).clone();
                    let next = HistogramState::advance(&prev, rng);
                    *lock(&histogram) = next;
                    log.record_histogram_tick();
                },
            )
        });

        self.stats_task.arm(|| {
            let stats = self.stats.clone();
            let estimator = self.estimator;
            let log = self.log.clone();
            PeriodicTask::spawn(
                "rolling-stats",
                Schedule::Fixed(self.config.stats_interval),
                StdRng::seed_from_u64(stats_seed),
                move |rng| {
                    let prev = *lock(&stats);
                    let next = estimator.advance(&prev, rng);
                    *lock(&stats) = next;
                    log.record_stats_tick();
                },
            )
        });

        self.simulator.start()
    }

    /// Stop every timer. Returns false when already idle.
    pub fn stop_recording(&self) -> bool {
        self.histogram_task.disarm();
        self.stats_task.disarm();
        self.simulator.stop()
    }

    pub fn is_recording(&self) -> bool {
        self.simulator.state() == SimulatorState::Recording
    }

    /// Classify an uploaded media item; the result lands in the store.
    pub async fn classify(&self, media: &MediaItem) -> Result<DetectionEvent, UploadError> {
        self.classifier.classify(media).await
    }

    /// Copy of the event history, oldest first.
    pub fn events(&self) -> Vec<DetectionEvent> {
        self.store.snapshot()
    }

    /// Events matching `query`, oldest first.
    pub fn query(&self, query: &RecordQuery) -> Vec<DetectionEvent> {
        query.apply(&self.store.snapshot())
    }

    /// Live detections produced by this session.
    pub fn detections(&self) -> u64 {
        self.simulator.detections()
    }

    /// Most recent live detection.
    pub fn latest_detection(&self) -> Option<DetectionEvent> {
        self.simulator.latest()
    }

    /// Current running histogram.
    pub fn histogram(&self) -> HistogramState {
        lock(&self.histogram).clone()
    }

    /// Current rolling stats.
    pub fn stats(&self) -> RollingStatsSnapshot {
        *lock(&self.stats)
    }

    pub fn confidence_summary(&self) -> Option<ConfidenceSummary> {
        ConfidenceSummary::from_events(&self.store.snapshot())
    }

    /// Render the current history as CSV.
    pub fn export_csv(&self) -> String {
        let events = self.store.snapshot();
        let csv = self.exporter.to_csv(&events);
        self.record_export(events.len());
        csv
    }

    /// Write the current history to `path` in `format`.
    pub fn export_to(&self, path: &Path, format: ExportFormat) -> Result<usize, ExportError> {
        let events = self.store.snapshot();
        self.exporter.write(path, &events, format)?;
        self.record_export(events.len());
        Ok(events.len())
    }

    fn record_export(&self, rows: usize) {
        self.log.record_export();
        self.notifier.notify(Notification::DataExported { rows });
    }

    /// Clear the event history. Aggregates are left as they are.
    pub fn reset_events(&self) {
        self.store.reset();
    }

    pub fn store(&self) -> &SharedEventStore {
        &self.store
    }

    pub fn log(&self) -> &SharedSessionLog {
        &self.log
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.stop_recording();
    }
}
