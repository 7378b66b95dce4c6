pub mod engine;
pub mod video_motion;

pub use engine::MotionEngine;
pub use video_motion::{GlobalMotion, VideoMotion};
