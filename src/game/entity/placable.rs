//! Placable Entities
//!
//! The unit of placement: a single piece or a whole set, sharing one
//! capability surface. Transforms are stored relative to the parent set;
//! bounds are derived from the current transform on demand.

use std::collections::BTreeSet;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::game::catalog::{PieceDefinition, ScaleAxis, ScaleMetrics};
use crate::game::restriction::RestrictionSet;
use crate::game::snap::SnapPolicy;
use crate::game::stroke::{ConnectionDirection, StrokeCategory, StrokeType};
use crate::world::{AxisBounds, Frame};

use super::kind::EntityKind;
use super::rotation::SplitRotation;
use super::EntityId;

/// Where an entity is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementStatus {
    /// Following the pointer; invisible to spatial queries
    Live,
    /// Member of a set that is being authored
    Editable,
    /// Committed to the scene
    Placed,
}

/// Snapping memory kept between placement calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridMemo {
    /// Lattice-stable position used to re-anchor a set's grid center
    pub last_grid_position: Vec3,
    /// World position written by the last snapped placement
    pub last_position: Option<Vec3>,
    /// Whether the last snapped placement moved the entity
    pub position_changed: bool,
    /// Height reached by the last stacking pass
    pub last_y_stack: f32,
}

/// Connector state of a stroke piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeLink {
    pub category: StrokeCategory,
    pub archetype: StrokeType,
    /// Canonical directions in the piece's own frame
    pub directions: Vec<ConnectionDirection>,
    /// Neighbours currently joined to this piece
    pub connected: BTreeSet<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacableEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Catalog id for pieces, `None` for sets
    pub piece_id: Option<String>,
    pub parent: Option<EntityId>,
    pub position: Vec3,
    pub rotation: SplitRotation,
    pub scale: Vec3,
    /// Unscaled footprint
    pub bound_size: Vec3,
    /// Bounds center relative to the pivot
    pub bounds_offset: Vec3,
    /// Declared restrictions (aggregated from members for sets)
    pub restrictions: RestrictionSet,
    /// Own snap type, never `Default`
    pub snap: SnapPolicy,
    pub scale_axis: ScaleAxis,
    /// Local axis that align-to-surface turns onto the hit normal
    pub up_axis: Vec3,
    pub status: PlacementStatus,
    pub active: bool,
    pub memo: GridMemo,
    pub colors: Vec<String>,
    pub textures: Vec<String>,
    pub stroke: Option<StrokeLink>,
}

impl PlacableEntity {
    /// A live entity for `piece` at the origin.
    pub fn from_piece(id: EntityId, piece: &PieceDefinition) -> Self {
        Self {
            id,
            kind: piece.kind,
            piece_id: Some(piece.id.clone()),
            parent: None,
            position: Vec3::ZERO,
            rotation: SplitRotation::IDENTITY,
            scale: Vec3::ONE,
            bound_size: piece.bound_size,
            bounds_offset: piece.bounds_offset,
            restrictions: piece.restrictions(Vec3::ONE),
            snap: piece.own_snap(),
            scale_axis: piece.scale_axis,
            up_axis: Vec3::Y,
            status: PlacementStatus::Live,
            active: true,
            memo: GridMemo::default(),
            colors: piece.colors.clone(),
            textures: piece.textures.clone(),
            stroke: piece.stroke.as_ref().map(|s| StrokeLink {
                category: s.category,
                archetype: s.archetype,
                directions: s.directions.clone(),
                connected: BTreeSet::new(),
            }),
        }
    }

    /// An empty set with uninitialized bounds.
    pub fn new_set(id: EntityId) -> Self {
        let caps = EntityKind::Set.capabilities();
        Self {
            id,
            kind: EntityKind::Set,
            piece_id: None,
            parent: None,
            position: Vec3::ZERO,
            rotation: SplitRotation::IDENTITY,
            scale: Vec3::ONE,
            bound_size: Vec3::ZERO,
            bounds_offset: Vec3::ZERO,
            restrictions: caps.restrictions,
            snap: caps.default_snap,
            scale_axis: ScaleAxis::Bounds,
            up_axis: Vec3::Y,
            status: PlacementStatus::Placed,
            active: true,
            memo: GridMemo::default(),
            colors: Vec::new(),
            textures: Vec::new(),
            stroke: None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.kind.is_set()
    }

    pub fn defines_boundary(&self) -> bool {
        self.kind.capabilities().defines_boundary
    }

    pub fn cuts_grid(&self) -> bool {
        self.kind.capabilities().cuts_grid
    }

    pub fn is_stroke(&self) -> bool {
        self.stroke.is_some()
    }

    /// Local transform with the rotation resolved under `restrictions`.
    pub fn local_frame(&self, restrictions: &RestrictionSet) -> Frame {
        Frame::new(self.position, self.rotation.effective(restrictions), self.scale)
    }

    /// Bounds measured against an owner frame (normally the world frame).
    pub fn bounds_in(&self, frame: Frame) -> AxisBounds {
        AxisBounds::new(self.bounds_offset, self.bound_size, frame)
    }

    /// Footprint sizes at a given world scale.
    pub fn metrics(&self, world_scale: Vec3) -> ScaleMetrics {
        self.scale_axis.metrics((self.bound_size * world_scale).abs())
    }

    /// Replace the base rotation, keeping the offset.
    pub fn set_base_rotation(&mut self, base: Quat) {
        self.rotation.base = base;
    }
}
