use crate::core::{DrawableId, DrawableShape};
use crate::hal::{Renderer, StepClock};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Step clock reporting a settable interval
pub struct FixedStepClock {
    interval: Mutex<Duration>,
}

impl FixedStepClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: Mutex::new(interval),
        }
    }

    pub fn set_interval(&self, interval: Duration) {
        *self.interval.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = interval;
    }
}

impl StepClock for FixedStepClock {
    fn current_step_interval(&self) -> Duration {
        *self.interval.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Renderer backed by a fixed drawable table
#[derive(Default)]
pub struct StaticRenderer {
    drawables: Mutex<HashMap<DrawableId, DrawableShape>>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: DrawableId, shape: DrawableShape) {
        self.drawables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, shape);
    }
}

impl Renderer for StaticRenderer {
    fn drawable_shape(&self, id: DrawableId) -> Option<DrawableShape> {
        self.drawables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned()
    }
}
