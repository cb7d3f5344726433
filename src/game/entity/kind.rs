//! Entity Kinds
//!
//! What a kind of entity can do is data, not a type hierarchy: every kind
//! maps to a row of capabilities (boundary, grid cutting, default snap and
//! restrictions). A set's restrictions are aggregated from its members
//! instead of read from the table.

use serde::{Deserialize, Serialize};

use crate::game::restriction::{
    PositionRestriction, RestrictionSet, RotationRestriction, SpaceRestriction,
};
use crate::game::snap::SnapPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Decoration without gameplay behaviour
    Static,
    /// Decoration the player can interact with
    Interactive,
    /// Walls, floors and other boundary-defining parts
    Structure,
    /// Grid-locked foundation pieces that anchor a set
    Core,
    /// Connector pieces placed by strokes (paths, fences)
    Stroke,
    /// A group of pieces
    Set,
}

/// One row of the capability table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindCapabilities {
    /// Used as the grid anchor and rotation reference of its set
    pub defines_boundary: bool,
    /// Cuts the terrain/grid beneath it
    pub cuts_grid: bool,
    pub default_snap: SnapPolicy,
    pub restrictions: RestrictionSet,
}

const LOCKED: RestrictionSet = RestrictionSet {
    position: PositionRestriction::GridOnly,
    position_grid: 0.0,
    rotation: RotationRestriction::YOnly,
    rotation_step: 90.0,
    space: SpaceRestriction::WorldOnly,
    scalable: false,
};

impl EntityKind {
    pub fn capabilities(&self) -> KindCapabilities {
        let (defines_boundary, cuts_grid, default_snap, restrictions) = match self {
            EntityKind::Static | EntityKind::Interactive => {
                (false, false, SnapPolicy::FreeForm, RestrictionSet::UNRESTRICTED)
            }
            EntityKind::Structure => (true, false, SnapPolicy::Edge, RestrictionSet::UNRESTRICTED),
            EntityKind::Core | EntityKind::Stroke => (true, true, SnapPolicy::Center, LOCKED),
            EntityKind::Set => (false, true, SnapPolicy::FreeForm, RestrictionSet::UNRESTRICTED),
        };
        KindCapabilities {
            defines_boundary,
            cuts_grid,
            default_snap,
            restrictions,
        }
    }

    pub fn defines_boundary(&self) -> bool {
        self.capabilities().defines_boundary
    }

    pub fn is_set(&self) -> bool {
        matches!(self, EntityKind::Set)
    }
}
