use crate::core::{EntityId, MotionState, Target};
use crate::hal::Renderer;
use crate::resilience::{lock_engine, SharedEngine};
use super::MotionStateStore;
use std::sync::Arc;

/// Brightness strictly below this reads as "dark"
pub const BRIGHTNESS_THRESHOLD: f64 = 30.0;

/// Local motion strictly above this reads as "moving"
pub const MOTION_THRESHOLD: f64 = 10.0;

/// Boolean queries combining engine readings with per-entity motion state
pub struct PredicateBridge {
    engine: SharedEngine,
    renderer: Arc<dyn Renderer>,
    states: MotionStateStore,
}

impl PredicateBridge {
    pub fn new(engine: SharedEngine, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            engine,
            renderer,
            states: MotionStateStore::new(),
        }
    }

    /// False until the engine has a brightness reading
    pub fn brightness_below_threshold(&self) -> bool {
        lock_engine(&self.engine)
            .current_brightness()
            .is_some_and(|brightness| brightness < BRIGHTNESS_THRESHOLD)
    }

    /// Refreshes the analysis on every call, then judges the target's own region
    pub fn motion_above_threshold(&mut self, target: &Target) -> bool {
        let mut engine = lock_engine(&self.engine);
        engine.refresh_global_analysis();

        let state = self.states.get_or_create(target.id);
        match target.drawable_id.and_then(|id| self.renderer.drawable_shape(id)) {
            Some(shape) => engine.compute_local_motion(&shape, state),
            None => log::debug!("Entity {} has no drawable, keeping its last motion reading", target.id.0),
        }

        state.motion_amount > MOTION_THRESHOLD
    }

    pub fn motion_state(&self, id: EntityId) -> Option<&MotionState> {
        self.states.get(id)
    }

    pub fn states(&self) -> &MotionStateStore {
        &self.states
    }
}
