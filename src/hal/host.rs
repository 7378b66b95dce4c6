use std::sync::Arc;
use tokio::runtime::Handle;
use super::{AudioBackend, Renderer, StepClock, VideoProvider};

/// Capabilities the host hands to one extension instance.
///
/// `video` and `audio` are optional: a host without a camera or without an
/// audio engine simply leaves them unset. `runtime` is where the acquisition
/// loop is spawned; without it the runtime current at construction is used.
#[derive(Clone)]
pub struct Host {
    pub video: Option<Arc<dyn VideoProvider>>,
    pub audio: Option<Arc<dyn AudioBackend>>,
    pub renderer: Arc<dyn Renderer>,
    pub clock: Arc<dyn StepClock>,
    pub runtime: Option<Handle>,
}

impl Host {
    pub fn new(renderer: Arc<dyn Renderer>, clock: Arc<dyn StepClock>) -> Self {
        Self {
            video: None,
            audio: None,
            renderer,
            clock,
            runtime: None,
        }
    }

    pub fn with_video(mut self, video: Arc<dyn VideoProvider>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioBackend>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Runtime the acquisition loop runs on, if any can be found
    pub fn runtime(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    /// The video provider, if one is present and reports a live device
    pub fn live_video(&self) -> Option<Arc<dyn VideoProvider>> {
        self.video.as_ref().filter(|v| v.is_available()).cloned()
    }
}
