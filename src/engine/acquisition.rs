use crate::core::FrameRequest;
use crate::hal::{StepClock, VideoProvider};
use crate::observability::SensingMetrics;
use crate::resilience::resilient_engine::panic_message;
use crate::resilience::{lock_engine, SharedEngine};
use anyhow::{Context, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};

/// Minimum time between accepted frames, and the floor of the reschedule delay
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(30);

/// What a single wake-up of the loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// A frame was requested from the video source
    pub requested: bool,
    /// The video source returned a frame and the timing cursor advanced
    pub captured: bool,
    /// Delay until the next wake-up
    pub next_delay: Duration,
}

/// Rate-limited frame pump from the host video source into the motion engine
pub struct FrameAcquisition {
    video: Arc<dyn VideoProvider>,
    clock: Arc<dyn StepClock>,
    engine: SharedEngine,
    request: FrameRequest,
    metrics: Arc<SensingMetrics>,
    last_update: Option<Instant>,
}

impl FrameAcquisition {
    pub fn new(
        video: Arc<dyn VideoProvider>,
        clock: Arc<dyn StepClock>,
        engine: SharedEngine,
        request: FrameRequest,
        metrics: Arc<SensingMetrics>,
    ) -> Self {
        Self {
            video,
            clock,
            engine,
            request,
            metrics,
            last_update: None,
        }
    }

    /// Time the last frame was accepted; set to the first wake-up otherwise
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// Delay before the next wake-up, never below `MIN_FRAME_INTERVAL`
    pub fn next_delay(&self) -> Duration {
        self.clock.current_step_interval().max(MIN_FRAME_INTERVAL)
    }

    /// Run one wake-up at time `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        self.metrics.record_wakeup();

        let last = *self.last_update.get_or_insert(now);
        let elapsed = now.saturating_duration_since(last);

        let mut outcome = TickOutcome {
            requested: false,
            captured: false,
            next_delay: self.next_delay(),
        };

        if elapsed > MIN_FRAME_INTERVAL {
            outcome.requested = true;
            self.metrics.record_frame_request();

            let (video, request) = (&self.video, &self.request);
            let frame = panic::catch_unwind(AssertUnwindSafe(|| video.get_frame(request)))
                .unwrap_or_else(|payload| {
                    log::warn!("Video source panicked: {}", panic_message(payload.as_ref()));
                    None
                });

            match frame {
                Some(frame) => {
                    self.last_update = Some(now);
                    outcome.captured = true;
                    self.metrics.record_frame_accepted();

                    if !lock_engine(&self.engine).ingest(&frame) {
                        log::debug!("Frame dropped by motion engine");
                    }
                }
                None => self.metrics.record_empty_capture(),
            }
        }

        outcome
    }

    /// Run the loop on `runtime` until the handle is stopped
    pub fn spawn(mut self, runtime: &Handle) -> AcquisitionHandle {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let task = runtime.spawn(async move {
            log::info!(
                "Frame acquisition started ({}x{})",
                self.request.width,
                self.request.height
            );

            loop {
                let outcome = self.tick(Instant::now());
                tokio::select! {
                    _ = sleep(outcome.next_delay) => {}
                    _ = shutdown_rx.recv() => break,
                }
            }

            log::info!("Frame acquisition stopped");
        });

        AcquisitionHandle {
            shutdown_tx,
            task: Some(task),
        }
    }
}

/// Cancellation handle of a spawned acquisition loop
pub struct AcquisitionHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl AcquisitionHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the loop and wait for it to exit
    pub async fn stop(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.task.take() {
            task.await.context("Frame acquisition task failed")?;
        }
        Ok(())
    }
}

/// Dropping the handle still stops the loop, it just cannot wait for it.
impl Drop for AcquisitionHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frame;
    use crate::hal::mock::{FixedStepClock, SimulatedCamera};
    use crate::motion::VideoMotion;
    use crate::resilience::{ErrorPolicy, ResilientEngine};
    use crate::hal::VideoProvider;

    fn acquisition(camera: Arc<SimulatedCamera>, step: Duration) -> (FrameAcquisition, Arc<SensingMetrics>) {
        let metrics = Arc::new(SensingMetrics::new());
        let engine = ResilientEngine::new(
            Box::new(VideoMotion::new(480, 360)),
            metrics.clone(),
            ErrorPolicy::LogAndContinue,
        )
        .into_shared();
        let acq = FrameAcquisition::new(
            camera,
            Arc::new(FixedStepClock::new(step)),
            engine,
            FrameRequest::default(),
            metrics.clone(),
        );
        (acq, metrics)
    }

    #[test]
    fn test_first_tick_only_sets_cursor() {
        let camera = Arc::new(SimulatedCamera::new());
        camera.enable_video().unwrap();
        let (mut acq, _) = acquisition(camera.clone(), Duration::from_millis(16));

        let t0 = Instant::now();
        let outcome = acq.tick(t0);
        assert!(!outcome.requested);
        assert_eq!(acq.last_update(), Some(t0));
        assert_eq!(camera.request_count(), 0);
    }

    #[test]
    fn test_next_delay_has_floor() {
        let camera = Arc::new(SimulatedCamera::new());
        let (acq, _) = acquisition(camera.clone(), Duration::from_millis(16));
        assert_eq!(acq.next_delay(), Duration::from_millis(30));

        let (acq, _) = acquisition(camera, Duration::from_millis(50));
        assert_eq!(acq.next_delay(), Duration::from_millis(50));
    }

    struct FaultyCamera;

    impl VideoProvider for FaultyCamera {
        fn is_available(&self) -> bool {
            true
        }

        fn enable_video(&self) -> Result<()> {
            Ok(())
        }

        fn set_preview_ghost(&self, _level: u8) {}

        fn get_frame(&self, _request: &FrameRequest) -> Option<Frame> {
            panic!("capture buffer torn down")
        }
    }

    #[test]
    fn test_panicking_video_source_counts_as_empty_capture() {
        let metrics = Arc::new(SensingMetrics::new());
        let engine = ResilientEngine::new(
            Box::new(VideoMotion::new(480, 360)),
            metrics.clone(),
            ErrorPolicy::LogAndContinue,
        )
        .into_shared();
        let mut acq = FrameAcquisition::new(
            Arc::new(FaultyCamera),
            Arc::new(FixedStepClock::new(Duration::from_millis(16))),
            engine,
            FrameRequest::default(),
            metrics.clone(),
        );

        let t0 = Instant::now();
        acq.tick(t0);
        let outcome = acq.tick(t0 + Duration::from_millis(31));
        assert!(outcome.requested);
        assert!(!outcome.captured);
        assert_eq!(metrics.empty_captures(), 1);
        assert_eq!(acq.last_update(), Some(t0));
    }

    #[test]
    fn test_captured_frame_reaches_engine() {
        let camera = Arc::new(SimulatedCamera::new());
        camera.enable_video().unwrap();
        camera.set_constant_frame(Some(Frame::filled(480, 360, [10, 10, 10, 255])));
        let (mut acq, metrics) = acquisition(camera, Duration::from_millis(16));

        let t0 = Instant::now();
        acq.tick(t0);
        let outcome = acq.tick(t0 + Duration::from_millis(31));
        assert!(outcome.requested && outcome.captured);
        assert_eq!(metrics.frames_accepted(), 1);
        assert_eq!(lock_engine(&acq.engine).frame_number(), 1);
    }
}
