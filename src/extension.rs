use crate::blocks::{BlockOpcode, BlockValue};
use crate::config::SensingConfig;
use crate::core::{EntityId, MotionState, Target};
use crate::engine::{AcquisitionHandle, FrameAcquisition, OutputController, OutputState, PredicateBridge};
use crate::hal::Host;
use crate::motion::{MotionEngine, VideoMotion};
use crate::observability::SensingMetrics;
use crate::resilience::{lock_engine, ResilientEngine, SharedEngine};
use anyhow::Result;
use std::sync::Arc;

/// One running instance of the sensing/actuation extension.
///
/// Owns the motion engine, the per-entity motion records, the tone output
/// and the acquisition loop. The host constructs one per running program and
/// calls `shutdown` when the program stops.
pub struct WaniBoard {
    config: SensingConfig,
    engine: SharedEngine,
    predicates: PredicateBridge,
    output: OutputController,
    acquisition: Option<AcquisitionHandle>,
    metrics: Arc<SensingMetrics>,
}

impl WaniBoard {
    /// Build with the built-in `VideoMotion` engine
    pub fn new(host: Host, config: SensingConfig) -> Self {
        let engine = Box::new(VideoMotion::new(config.width, config.height));
        Self::with_engine(host, config, engine)
    }

    /// Build around a caller-supplied motion engine.
    ///
    /// The acquisition loop only starts when the host has a live video
    /// device and a Tokio runtime, either `Host::runtime` or the one current
    /// here; otherwise motion sensing stays inactive.
    pub fn with_engine(host: Host, config: SensingConfig, engine: Box<dyn MotionEngine>) -> Self {
        let metrics = Arc::new(SensingMetrics::new());
        let engine = ResilientEngine::new(engine, metrics.clone(), config.error_policy).into_shared();
        let acquisition = start_acquisition(&host, &config, &engine, &metrics);

        Self {
            predicates: PredicateBridge::new(engine.clone(), host.renderer.clone()),
            output: OutputController::new(host.audio.clone()),
            config,
            engine,
            acquisition,
            metrics,
        }
    }

    pub fn brightness_below_threshold(&self) -> bool {
        self.predicates.brightness_below_threshold()
    }

    pub fn motion_above_threshold(&mut self, target: &Target) -> bool {
        self.predicates.motion_above_threshold(target)
    }

    pub async fn switch_on(&mut self, target: &Target) {
        self.output.switch_on(target).await
    }

    pub async fn switch_off(&mut self) {
        self.output.switch_off().await
    }

    /// Run a block by opcode on behalf of `target`
    pub async fn execute(&mut self, opcode: BlockOpcode, target: &Target) -> BlockValue {
        match opcode {
            BlockOpcode::WhenBrightLessThan => BlockValue::Bool(self.brightness_below_threshold()),
            BlockOpcode::WhenMotionGreaterThan => BlockValue::Bool(self.motion_above_threshold(target)),
            BlockOpcode::SwitchOn => {
                self.switch_on(target).await;
                BlockValue::Unit
            }
            BlockOpcode::SwitchOff => {
                self.switch_off().await;
                BlockValue::Unit
            }
        }
    }

    /// Stop the acquisition loop and silence the output.
    ///
    /// The output is switched off even when the loop ended abnormally; that
    /// failure is returned afterwards.
    pub async fn shutdown(&mut self) -> Result<()> {
        let stopped = match self.acquisition.take() {
            Some(acquisition) => acquisition.stop().await,
            None => Ok(()),
        };
        self.output.switch_off().await;
        stopped
    }

    pub fn is_sensing(&self) -> bool {
        self.acquisition.as_ref().is_some_and(|a| a.is_running())
    }

    pub fn output_state(&self) -> &OutputState {
        self.output.state()
    }

    pub fn output_frequency(&self) -> Option<f64> {
        self.output.frequency()
    }

    pub fn motion_state(&self, id: EntityId) -> Option<&MotionState> {
        self.predicates.motion_state(id)
    }

    /// Frames the motion engine has taken in so far
    pub fn frames_ingested(&self) -> u64 {
        lock_engine(&self.engine).frame_number()
    }

    pub fn metrics(&self) -> Arc<SensingMetrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &SensingConfig {
        &self.config
    }
}

fn start_acquisition(
    host: &Host,
    config: &SensingConfig,
    engine: &SharedEngine,
    metrics: &Arc<SensingMetrics>,
) -> Option<AcquisitionHandle> {
    let Some(video) = host.live_video() else {
        log::info!("No video device, motion sensing stays inactive");
        return None;
    };
    let Some(runtime) = host.runtime() else {
        log::warn!("No Tokio runtime, motion sensing stays inactive");
        return None;
    };
    if let Err(e) = video.enable_video() {
        log::warn!("Failed to enable video, motion sensing stays inactive: {:#}", e);
        return None;
    }
    video.set_preview_ghost(config.preview_ghost);

    let acquisition = FrameAcquisition::new(
        video,
        host.clock.clone(),
        engine.clone(),
        config.frame_request(),
        metrics.clone(),
    );
    Some(acquisition.spawn(&runtime))
}
