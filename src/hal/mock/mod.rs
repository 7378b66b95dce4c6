pub mod audio;
pub mod camera;
pub mod host;

pub use audio::{AudioEvent, SimulatedAudioGraph, SimulatedOscillator};
pub use camera::SimulatedCamera;
pub use host::{FixedStepClock, StaticRenderer};
