use async_trait::async_trait;
use anyhow::Result;
use std::time::Duration;
use crate::core::{DrawableId, DrawableShape, Frame, FrameRequest};

/// Host video capture capability
pub trait VideoProvider: Send + Sync {
    /// Whether a live video device is present
    fn is_available(&self) -> bool;

    /// Turn the camera on
    fn enable_video(&self) -> Result<()>;

    /// Transparency of the camera preview drawn behind the stage (0-100)
    fn set_preview_ghost(&self, ghost: u8);

    /// Grab the latest frame; `None` when the device has nothing yet
    fn get_frame(&self, request: &FrameRequest) -> Option<Frame>;
}

/// Host audio graph capability
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Allocate a new, unconnected signal source
    async fn create_oscillator(&self) -> Result<Box<dyn Oscillator>>;
}

/// A continuous-tone signal source living in the host audio graph
#[async_trait]
pub trait Oscillator: Send {
    fn set_frequency(&mut self, hz: f64);

    fn frequency(&self) -> f64;

    /// Connect into the host's audio input node
    async fn connect(&mut self) -> Result<()>;

    /// Begin emission
    async fn start(&mut self) -> Result<()>;

    /// End emission
    async fn stop(&mut self) -> Result<()>;

    /// Detach from the audio graph
    async fn disconnect(&mut self) -> Result<()>;
}

/// Host renderer capability
pub trait Renderer: Send + Sync {
    fn drawable_shape(&self, id: DrawableId) -> Option<DrawableShape>;
}

/// Host scheduler timing capability
pub trait StepClock: Send + Sync {
    /// Interval between host scheduler steps
    fn current_step_interval(&self) -> Duration;
}
