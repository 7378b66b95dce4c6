use crate::core::{EntityId, MotionState};
use std::collections::HashMap;

/// Motion records keyed by entity.
///
/// A record is created zeroed the first time an entity asks for motion and
/// lives as long as the extension instance; nothing here ever removes one.
#[derive(Debug, Default)]
pub struct MotionStateStore {
    states: HashMap<EntityId, MotionState>,
}

impl MotionStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity's record, created on first access
    pub fn get_or_create(&mut self, id: EntityId) -> &mut MotionState {
        self.states.entry(id).or_insert_with(|| {
            log::debug!("Created motion state for entity {}", id.0);
            MotionState::default()
        })
    }

    pub fn get(&self, id: EntityId) -> Option<&MotionState> {
        self.states.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
