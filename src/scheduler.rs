use crate::analysis::{PostureAnalyzer, PostureAssessment};
use crate::estimator::PoseEstimator;
use crate::intake::VideoSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Latest-assessment slot guarded by a generation counter. Each scheduler
/// run captures the generation once at start; a publish with a stale
/// generation is dropped. `invalidate` bumps the generation under the same
/// lock as `publish`, so once it returns nothing from the old run can
/// land, even across rapid stop/start cycles.
pub struct AssessmentSlot {
    inner: Mutex<SlotInner>,
}

struct SlotInner {
    generation: u64,
    tx: watch::Sender<PostureAssessment>,
}

impl AssessmentSlot {
    pub fn new() -> (Arc<Self>, watch::Receiver<PostureAssessment>) {
        let (tx, rx) = watch::channel(PostureAssessment::default());
        let slot = Arc::new(Self {
            inner: Mutex::new(SlotInner { generation: 0, tx }),
        });
        (slot, rx)
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        // The critical sections never panic; recover the guard if a
        // poisoned lock ever shows up anyway.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.lock().generation
    }

    /// Bump the generation so pending publishes become stale.
    pub fn invalidate(&self) {
        self.lock().generation += 1;
    }

    /// Publish if `generation` is still current. Returns false when the
    /// result was stale and dropped. The value is stored even when no
    /// receiver is alive, so `latest` always reflects the newest publish.
    pub fn publish(&self, generation: u64, assessment: PostureAssessment) -> bool {
        let inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.tx.send_replace(assessment);
        true
    }

    pub fn latest(&self) -> PostureAssessment {
        self.lock().tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PostureAssessment> {
        self.lock().tx.subscribe()
    }
}

/// Counters for one scheduling session.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    ticks_not_ready: AtomicU64,
    frames_submitted: AtomicU64,
    results_published: AtomicU64,
    results_discarded: AtomicU64,
    estimator_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerMetricsSnapshot {
    pub ticks_not_ready: u64,
    pub frames_submitted: u64,
    pub results_published: u64,
    pub results_discarded: u64,
    pub estimator_failures: u64,
}

impl SchedulerMetrics {
    pub fn snapshot(&self) -> SchedulerMetricsSnapshot {
        SchedulerMetricsSnapshot {
            ticks_not_ready: self.ticks_not_ready.load(Ordering::Relaxed),
            frames_submitted: self.frames_submitted.load(Ordering::Relaxed),
            results_published: self.results_published.load(Ordering::Relaxed),
            results_discarded: self.results_discarded.load(Ordering::Relaxed),
            estimator_failures: self.estimator_failures.load(Ordering::Relaxed),
        }
    }

    fn record_not_ready(&self) {
        self.ticks_not_ready.fetch_add(1, Ordering::Relaxed);
    }

    fn record_submitted(&self) {
        self.frames_submitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_published(&self) {
        self.results_published.fetch_add(1, Ordering::Relaxed);
    }

    fn record_discarded(&self) {
        self.results_discarded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.estimator_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Drives the analysis loop: poll the video source at the target frame
/// rate, submit ready frames to the estimator, publish assessments.
/// Submission runs as its own task so awaiting the estimator never delays
/// the next tick.
pub struct FrameScheduler {
    video: Arc<dyn VideoSource>,
    estimator: Arc<dyn PoseEstimator>,
    analyzer: Arc<PostureAnalyzer>,
    slot: Arc<AssessmentSlot>,
    metrics: Arc<SchedulerMetrics>,
    frame_interval: Duration,
    // Generation of this run, fixed at construction. A tick must never
    // re-read the live generation: a tick racing with `invalidate` could
    // observe the bumped value and publish as if it were fresh.
    generation: u64,
}

impl FrameScheduler {
    pub fn new(
        video: Arc<dyn VideoSource>,
        estimator: Arc<dyn PoseEstimator>,
        analyzer: PostureAnalyzer,
        slot: Arc<AssessmentSlot>,
        metrics: Arc<SchedulerMetrics>,
        frame_interval: Duration,
    ) -> Self {
        let generation = slot.current_generation();
        Self {
            video,
            estimator,
            analyzer: Arc::new(analyzer),
            slot,
            metrics,
            frame_interval,
            generation,
        }
    }

    /// Runs until the token is cancelled.
    pub async fn run(self, cancel_token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("Frame scheduler started at interval {:?}", self.frame_interval);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => self.tick(),
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            "Frame scheduler stopped: {} submitted, {} published, {} stale, {} not-ready ticks, {} failures",
            snapshot.frames_submitted,
            snapshot.results_published,
            snapshot.results_discarded,
            snapshot.ticks_not_ready,
            snapshot.estimator_failures
        );
    }

    fn tick(&self) {
        if !self.video.is_ready() {
            self.metrics.record_not_ready();
            return;
        }
        let Some(frame) = self.video.current_frame() else {
            self.metrics.record_not_ready();
            return;
        };

        let generation = self.generation;
        self.metrics.record_submitted();

        let estimator = self.estimator.clone();
        let analyzer = self.analyzer.clone();
        let slot = self.slot.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match estimator.estimate(&frame).await {
                Ok(Some(landmarks)) => {
                    // Incomplete landmark sets keep the previous assessment.
                    if let Some(assessment) = analyzer.analyze(&landmarks) {
                        if slot.publish(generation, assessment) {
                            metrics.record_published();
                        } else {
                            metrics.record_discarded();
                            debug!("Dropped stale assessment for frame {}", frame.id());
                        }
                    }
                }
                Ok(None) => {
                    debug!("No pose detected in frame {}", frame.id());
                }
                Err(e) => {
                    metrics.record_failure();
                    warn!("Estimator failed on frame {}: {}", frame.id(), e);
                }
            }
        });
    }
}
