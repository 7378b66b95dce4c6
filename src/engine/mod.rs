pub mod acquisition;
pub mod output;
pub mod predicates;
pub mod state_store;

pub use acquisition::{AcquisitionHandle, FrameAcquisition, TickOutcome, MIN_FRAME_INTERVAL};
pub use output::{OutputController, OutputState, TONE_FREQUENCY_HZ};
pub use predicates::{PredicateBridge, BRIGHTNESS_THRESHOLD, MOTION_THRESHOLD};
pub use state_store::MotionStateStore;
