use crate::analysis::{PostureAnalyzer, PostureAssessment};
use crate::config::Configuration;
use crate::error::AppError;
use crate::estimator::PoseEstimator;
use crate::intake::VideoSource;
use crate::scheduler::{AssessmentSlot, FrameScheduler, SchedulerMetrics, SchedulerMetricsSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// One continuous analysis session: owns the scheduler task and the latest
/// assessment. Created when recording starts, stopped when it ends.
pub struct PostureSession {
    scheduler_task: tokio::task::JoinHandle<()>,
    cancel_token: CancellationToken,
    slot: Arc<AssessmentSlot>,
    metrics: Arc<SchedulerMetrics>,
}

impl PostureSession {
    fn start(
        configuration: Configuration,
        video: Arc<dyn VideoSource>,
        estimator: Arc<dyn PoseEstimator>,
    ) -> Self {
        let (slot, _rx) = AssessmentSlot::new();
        let metrics = Arc::new(SchedulerMetrics::default());
        let cancel_token = CancellationToken::new();
        let analyzer = PostureAnalyzer::new(configuration.thresholds.clone());
        let scheduler = FrameScheduler::new(
            video,
            estimator,
            analyzer,
            slot.clone(),
            metrics.clone(),
            configuration.frame_interval(),
        );
        let scheduler_task = tokio::spawn(scheduler.run(cancel_token.clone()));

        Self {
            scheduler_task,
            cancel_token,
            slot,
            metrics,
        }
    }

    /// Current assessment snapshot. Holds the last published value when
    /// detection is failing (stale-but-valid carry-forward).
    pub fn latest(&self) -> PostureAssessment {
        self.slot.latest()
    }

    /// Watch receiver over assessment updates, last-write-wins.
    pub fn subscribe(&self) -> watch::Receiver<PostureAssessment> {
        self.slot.subscribe()
    }

    pub fn metrics(&self) -> SchedulerMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stops the session. Returns immediately without awaiting in-flight
    /// estimation; no assessment update is delivered after this returns.
    /// Safe to call any number of times.
    pub fn stop(&self) {
        // Invalidate first so an estimation completing between the two
        // calls is already stale by the time it tries to publish.
        self.slot.invalidate();
        self.cancel_token.cancel();
        self.scheduler_task.abort();
    }
}

impl Drop for PostureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct PostureSessionBuilder {
    configuration: Configuration,
    video: Option<Arc<dyn VideoSource>>,
    estimator: Option<Arc<dyn PoseEstimator>>,
}

impl PostureSessionBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            video: None,
            estimator: None,
        }
    }

    // Overrides the configured analysis rate.
    pub fn target_fps(mut self, target_fps: u32) -> Self {
        self.configuration.target_fps = target_fps;
        self
    }

    pub fn video_source(mut self, video: Arc<dyn VideoSource>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn estimator(mut self, estimator: Arc<dyn PoseEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn build(self) -> Result<PostureSession, AppError> {
        self.configuration.validate().map_err(AppError::Config)?;
        let video = self
            .video
            .ok_or(AppError::Session("Video source not set".to_string()))?;
        let estimator = self
            .estimator
            .ok_or(AppError::Session("Estimator not set".to_string()))?;
        Ok(PostureSession::start(self.configuration, video, estimator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PoseLandmarks, VideoFrame};
    use crate::error::EstimatorError;
    use crate::estimator::{EstimatorOptions, PoseEstimator, SimulatedEstimator};
    use crate::intake::{SyntheticVideoSource, VideoSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Condvar, Mutex};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Estimator that parks every estimate until a permit is released,
    /// then replays a canned result.
    struct GatedEstimator {
        gate: Arc<Semaphore>,
        inner: SimulatedEstimator,
    }

    impl GatedEstimator {
        fn new(gate: Arc<Semaphore>) -> Self {
            Self {
                gate,
                inner: SimulatedEstimator::new(EstimatorOptions::default())
                    .with_latency(Duration::from_millis(0)),
            }
        }
    }

    #[async_trait]
    impl PoseEstimator for GatedEstimator {
        async fn estimate(
            &self,
            frame: &VideoFrame,
        ) -> Result<Option<PoseLandmarks>, EstimatorError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| EstimatorError::Inference(e.to_string()))?;
            permit.forget();
            self.inner.estimate(frame).await
        }
    }

    /// Source that parks frame requests inside `current_frame` until
    /// released, pinning a tick mid-flight.
    struct ParkingSource {
        inner: SyntheticVideoSource,
        entered: AtomicBool,
        release: (Mutex<bool>, Condvar),
    }

    impl ParkingSource {
        fn new() -> Self {
            Self {
                inner: SyntheticVideoSource::new(64, 48),
                entered: AtomicBool::new(false),
                release: (Mutex::new(false), Condvar::new()),
            }
        }

        fn entered(&self) -> bool {
            self.entered.load(Ordering::SeqCst)
        }

        fn release(&self) {
            let (lock, cvar) = &self.release;
            *lock.lock().expect("release lock") = true;
            cvar.notify_all();
        }
    }

    impl VideoSource for ParkingSource {
        fn is_ready(&self) -> bool {
            true
        }

        fn current_frame(&self) -> Option<VideoFrame> {
            self.entered.store(true, Ordering::SeqCst);
            // Waiting on the condvar directly would block the worker that
            // drives the runtime's timers and hang the test.
            tokio::task::block_in_place(|| {
                let (lock, cvar) = &self.release;
                let mut released = lock.lock().expect("release lock");
                while !*released {
                    released = cvar.wait(released).expect("release wait");
                }
            });
            self.inner.current_frame()
        }
    }

    fn builder() -> PostureSessionBuilder {
        PostureSessionBuilder::new(Configuration::default())
    }

    #[tokio::test]
    async fn build_requires_collaborators() {
        assert!(builder().build().is_err());
        assert!(builder()
            .video_source(Arc::new(SyntheticVideoSource::new(64, 48)))
            .build()
            .is_err());
    }

    #[tokio::test]
    async fn session_publishes_assessments() {
        let session = builder()
            .target_fps(100)
            .video_source(Arc::new(SyntheticVideoSource::new(64, 48)))
            .estimator(Arc::new(
                SimulatedEstimator::new(EstimatorOptions::default())
                    .with_latency(Duration::from_millis(0)),
            ))
            .build()
            .expect("session");

        let mut rx = session.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("assessment before timeout")
            .expect("sender alive");

        let assessment = session.latest();
        assert!(assessment.warnings.is_empty());
        assert!(assessment.confidence > 0.0);
        assert!(session.metrics().frames_submitted >= 1);
        session.stop();
    }

    #[tokio::test]
    async fn unready_source_skips_ticks_without_failing() {
        let video = Arc::new(SyntheticVideoSource::new(64, 48));
        video.set_ready(false);
        let session = builder()
            .target_fps(200)
            .video_source(video.clone())
            .estimator(Arc::new(
                SimulatedEstimator::new(EstimatorOptions::default())
                    .with_latency(Duration::from_millis(0)),
            ))
            .build()
            .expect("session");

        tokio::time::sleep(Duration::from_millis(100)).await;
        let metrics = session.metrics();
        assert!(metrics.ticks_not_ready >= 1);
        assert_eq!(metrics.frames_submitted, 0);
        assert_eq!(session.latest(), PostureAssessment::default());
        session.stop();
    }

    #[tokio::test]
    async fn stale_estimation_after_stop_is_dropped() {
        let gate = Arc::new(Semaphore::new(0));
        let session = builder()
            .target_fps(200)
            .video_source(Arc::new(SyntheticVideoSource::new(64, 48)))
            .estimator(Arc::new(GatedEstimator::new(gate.clone())))
            .build()
            .expect("session");

        // Wait until at least one frame is parked inside the estimator.
        tokio::time::timeout(Duration::from_secs(2), async {
            while session.metrics().frames_submitted == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("frame submitted before timeout");

        session.stop();

        // Release the parked estimations; their results must be stale.
        gate.add_permits(64);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(session.latest(), PostureAssessment::default());
        assert!(session.metrics().results_discarded >= 1);
        assert_eq!(session.metrics().results_published, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tick_racing_stop_cannot_publish() {
        let video = Arc::new(ParkingSource::new());
        let session = builder()
            .target_fps(200)
            .video_source(video.clone())
            .estimator(Arc::new(
                SimulatedEstimator::new(EstimatorOptions::default())
                    .with_latency(Duration::from_millis(0)),
            ))
            .build()
            .expect("session");

        // Wait until a tick is parked inside the video source.
        tokio::time::timeout(Duration::from_secs(2), async {
            while !video.entered() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("tick parked before timeout");

        // Stop while the tick is mid-flight, then let it proceed. Whatever
        // it produces belongs to the stopped run and must not land.
        session.stop();
        video.release();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(session.metrics().results_published, 0);
        assert_eq!(session.latest(), PostureAssessment::default());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let session = builder()
            .video_source(Arc::new(SyntheticVideoSource::new(64, 48)))
            .estimator(Arc::new(
                SimulatedEstimator::new(EstimatorOptions::default())
                    .with_latency(Duration::from_millis(0)),
            ))
            .build()
            .expect("session");
        session.stop();
        session.stop();
        session.stop();
    }
}
