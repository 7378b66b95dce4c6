pub mod entity;
pub mod frame;

pub use entity::{Bounds, DrawableId, DrawableShape, EntityId, MotionState, Target};
pub use frame::{Frame, FrameFormat, FrameRequest};
