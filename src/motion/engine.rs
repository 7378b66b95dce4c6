use anyhow::Result;
use crate::core::{DrawableShape, Frame, MotionState};

/// Contract of a frame-differencing motion analyser.
///
/// Implementations keep whatever frame history they need internally; callers
/// only hand over frames and ask for readings. Any method may fail, and
/// callers must treat failures as non-fatal.
pub trait MotionEngine: Send {
    /// Blend a new frame into the accumulator. Called at an irregular cadence.
    fn ingest(&mut self, frame: &Frame) -> Result<()>;

    /// Brightness of the most recent frame, `None` before any frame arrived
    fn current_brightness(&self) -> Result<Option<f64>>;

    /// Recompute the whole-frame motion summary
    fn refresh_global_analysis(&mut self) -> Result<()>;

    /// Refresh `state` with the motion found inside `shape`
    fn compute_local_motion(&mut self, shape: &DrawableShape, state: &mut MotionState) -> Result<()>;

    /// Number of frames ingested so far
    fn frame_number(&self) -> u64;
}
