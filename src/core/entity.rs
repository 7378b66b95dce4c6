use serde::{Deserialize, Serialize};

/// Stage width in stage units; the stage origin is its centre
pub const STAGE_WIDTH: f64 = 480.0;

/// Stage height in stage units
pub const STAGE_HEIGHT: f64 = 360.0;

/// Identifier of a program entity (sprite or clone)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Identifier of an entity's drawable in the host renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawableId(pub u64);

/// Axis-aligned rectangle in stage coordinates (y grows upwards)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Bounds {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self { left, right, bottom, top }
    }

    /// The whole stage
    pub fn stage() -> Self {
        Self::new(
            -STAGE_WIDTH / 2.0,
            STAGE_WIDTH / 2.0,
            -STAGE_HEIGHT / 2.0,
            STAGE_HEIGHT / 2.0,
        )
    }

    /// Pixel rectangle `[x0, x1) x [y0, y1)` covered by these bounds in a
    /// frame of the given size, clipped to the frame. `None` when the bounds
    /// fall entirely off-frame.
    pub fn to_frame_rect(&self, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
        let sx = width as f64 / STAGE_WIDTH;
        let sy = height as f64 / STAGE_HEIGHT;

        let x0 = ((self.left + STAGE_WIDTH / 2.0) * sx).floor().max(0.0);
        let x1 = ((self.right + STAGE_WIDTH / 2.0) * sx).ceil().min(width as f64);
        let y0 = ((STAGE_HEIGHT / 2.0 - self.top) * sy).floor().max(0.0);
        let y1 = ((STAGE_HEIGHT / 2.0 - self.bottom) * sy).ceil().min(height as f64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }
}

/// On-screen silhouette of an entity as reported by the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableShape {
    pub bounds: Bounds,
}

impl DrawableShape {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

/// Per-entity motion record, refreshed by local motion analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub last_analyzed_frame_number: u64,
    pub motion_amount: f64,
    pub motion_direction: f64,
}

/// The entity evaluating a block, as handed over by the host scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: EntityId,
    pub drawable_id: Option<DrawableId>,
    /// Whether the entity's sprite has a sound bank bound to it
    pub has_sound_bank: bool,
}

impl Target {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            drawable_id: None,
            has_sound_bank: false,
        }
    }

    pub fn with_drawable(mut self, drawable_id: DrawableId) -> Self {
        self.drawable_id = Some(drawable_id);
        self
    }

    pub fn with_sound_bank(mut self) -> Self {
        self.has_sound_bank = true;
        self
    }
}
