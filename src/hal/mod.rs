pub mod drivers;
pub mod host;
pub mod mock;
pub mod traits;

pub use drivers::CpalToneBackend;
pub use host::Host;
pub use traits::{AudioBackend, Oscillator, Renderer, StepClock, VideoProvider};
