//! Session Caches
//!
//! Resumable sub-state of each interactive state. A state writes its cache
//! back before it yields, so an interrupted interaction can be re-entered
//! later exactly where it stopped.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::game::collab::ToolbarHandle;
use crate::game::entity::EntityId;
use crate::game::scene::StackMode;
use crate::game::snap::SnapPolicy;

/// Axis a fast placement drag is locked to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FastPlaceAxis {
    /// Lift along Y from the vertical pointer movement
    #[default]
    Vertical,
    /// Slide along the dominant horizontal axis of the pointer movement
    Horizontal,
}

/// Per-placement scale applied on top of the piece's own size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailSettings {
    pub scale: Vec3,
}

impl Default for DetailSettings {
    fn default() -> Self {
        Self { scale: Vec3::ONE }
    }
}

impl DetailSettings {
    /// Scale with every axis clamped to `minimum`.
    pub fn clamped_scale(&self, minimum: f32) -> Vec3 {
        self.scale.max(Vec3::splat(minimum))
    }
}

/// Snapshot of an in-progress `PlaceObject` interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementCache {
    // === Rotation ===
    /// Seconds the rotate key has been held, `None` when released
    pub rotate_held: Option<f32>,
    /// Continuous rotation toward the pointer is running
    pub is_rotating: bool,
    /// Offset rotation when continuous rotation started
    pub start_rotation: Quat,
    /// Unsnapped rotation accumulated by continuous rotation
    pub snap_rotation: Quat,
    /// Screen x of the pointer on the previous rotation frame
    pub last_screen_x: f32,

    // === Fast placement ===
    pub is_fast_placing: bool,
    pub fast_place_axis: FastPlaceAxis,
    /// Accumulate the drag into `fast_place_offset` on release
    pub fast_place_set_offset: bool,
    /// Entity position when the drag started
    pub fast_place_start: Vec3,
    /// Pointer world position when the drag started
    pub fast_place_pointer: Vec3,
    /// Pointer screen position when the drag started
    pub fast_place_screen: Vec2,
    /// Added to every normal placement after snapping
    pub fast_place_offset: Vec3,

    /// Height reached by the last stacking pass
    pub last_y_stack: f32,

    // === Placement options ===
    pub local_space: bool,
    pub snap: SnapPolicy,
    pub stack: StackMode,
    /// Align the entity's up axis to the surface under the pointer
    pub align: bool,
    /// Temporary color keys; applied only when they match the entity's slots
    pub colors: Vec<String>,
    pub detail: DetailSettings,

    // === UI ===
    #[serde(skip)]
    pub toolbar: Option<ToolbarHandle>,
}

impl Default for PlacementCache {
    fn default() -> Self {
        Self {
            rotate_held: None,
            is_rotating: false,
            start_rotation: Quat::IDENTITY,
            snap_rotation: Quat::IDENTITY,
            last_screen_x: 0.0,
            is_fast_placing: false,
            fast_place_axis: FastPlaceAxis::Vertical,
            fast_place_set_offset: false,
            fast_place_start: Vec3::ZERO,
            fast_place_pointer: Vec3::ZERO,
            fast_place_screen: Vec2::ZERO,
            fast_place_offset: Vec3::ZERO,
            last_y_stack: 0.0,
            local_space: true,
            snap: SnapPolicy::Default,
            stack: StackMode::Disabled,
            align: true,
            colors: Vec::new(),
            detail: DetailSettings::default(),
            toolbar: None,
        }
    }
}

impl PlacementCache {
    /// Defaults for an entity: its own snap type, center stacking and no
    /// surface alignment for boundary definers.
    pub fn for_entity(own_snap: SnapPolicy, defines_boundary: bool) -> Self {
        Self {
            snap: own_snap,
            stack: if defines_boundary {
                StackMode::Center
            } else {
                StackMode::Disabled
            },
            align: !defines_boundary,
            ..Self::default()
        }
    }

    /// Fold a running vertical fast placement into the offset.
    ///
    /// Called on release and on commit so the drag carries over to the next
    /// piece. Only the Y component is kept.
    pub fn settle_fast_place(&mut self, position: Vec3) {
        if self.fast_place_set_offset {
            self.fast_place_offset += position - self.fast_place_start;
            self.fast_place_offset.x = 0.0;
            self.fast_place_offset.z = 0.0;
            self.fast_place_set_offset = false;
            self.last_y_stack = position.y;
        }
        self.is_fast_placing = false;
    }

    /// Drop the interaction in progress, keeping the options.
    pub fn reset_interaction(&mut self) {
        self.rotate_held = None;
        self.is_rotating = false;
        self.is_fast_placing = false;
        self.fast_place_set_offset = false;
    }
}

/// Transform gizmo of the selection state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleKind {
    #[default]
    Move,
    Rotate,
    Scale,
}

/// Snapshot of a `SelectObjects` interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectCache {
    pub handle: HandleKind,
    /// Handles follow the pivot frame instead of world axes
    pub local_space: bool,
    /// Drags apply to each entity around its own pivot
    pub per_object: bool,
    #[serde(skip)]
    pub toolbar: Option<ToolbarHandle>,
}

/// Phase of a stroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum StrokePhase {
    /// A single ghost point follows the pointer
    #[default]
    Aiming,
    /// The start is fixed and the end follows the pointer
    Drawing { start: Vec3 },
}

/// Snapshot of a `StrokePlace` interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeCache {
    pub phase: StrokePhase,
    /// Sets that lost members to stroke deletions, finalized on exit
    pub touched_sets: Vec<EntityId>,
    #[serde(skip)]
    pub toolbar: Option<ToolbarHandle>,
}
