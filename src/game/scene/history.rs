//! Undo Records
//!
//! Reversible scene edits registered with the undo collaborator. Each record
//! carries enough state to reverse (undo) or re-apply (redo) one edit.

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::game::entity::{EntityId, PlacableEntity, SplitRotation};
use crate::game::stroke::ConnectionDiff;

use super::Scene;

/// Parent-relative transform snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: SplitRotation,
    pub scale: Vec3,
}

impl LocalTransform {
    pub fn of(entity: &PlacableEntity) -> Self {
        Self {
            position: entity.position,
            rotation: entity.rotation,
            scale: entity.scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UndoRecord {
    /// An entity was committed; undo destroys it
    Placed { entity: EntityId },

    /// A handle drag changed an entity's transform
    Transformed {
        entity: EntityId,
        old: LocalTransform,
        new: LocalTransform,
    },

    /// Several records applied as one step
    Batch(Vec<UndoRecord>),
}

impl UndoRecord {
    /// Entities this record touches.
    pub fn entities(&self) -> Vec<EntityId> {
        match self {
            UndoRecord::Placed { entity } | UndoRecord::Transformed { entity, .. } => vec![*entity],
            UndoRecord::Batch(records) => records.iter().flat_map(|r| r.entities()).collect(),
        }
    }
}

impl Scene {
    pub fn capture_transform(&self, id: EntityId) -> Option<LocalTransform> {
        self.get(id).map(LocalTransform::of)
    }

    /// Write a local transform and refresh the parent set's bounds.
    pub fn apply_transform(&mut self, id: EntityId, transform: &LocalTransform) {
        let Some(entity) = self.get_mut(id) else {
            debug!("[Undo] Entity {} no longer exists", id);
            return;
        };
        entity.position = transform.position;
        entity.rotation = transform.rotation;
        entity.scale = transform.scale;
        if let Some(parent) = entity.parent {
            self.recompute_bounds(parent, false);
        }
    }

    /// Reverse a record. Returns the connection diffs of destroyed strokes.
    pub fn apply_undo(&mut self, record: &UndoRecord) -> Vec<ConnectionDiff> {
        match record {
            UndoRecord::Placed { entity } => self.destroy(*entity),
            UndoRecord::Transformed { entity, old, .. } => {
                self.apply_transform(*entity, old);
                Vec::new()
            }
            UndoRecord::Batch(records) => records.iter().rev().flat_map(|r| self.apply_undo(r)).collect(),
        }
    }

    /// Re-apply a record. Destroyed placements cannot be brought back, so
    /// this returns false when any part of the record was skipped.
    pub fn apply_redo(&mut self, record: &UndoRecord) -> bool {
        match record {
            UndoRecord::Placed { entity } => {
                debug!("[Undo] Placement of {} cannot be redone", entity);
                false
            }
            UndoRecord::Transformed { entity, new, .. } => {
                self.apply_transform(*entity, new);
                self.contains(*entity)
            }
            UndoRecord::Batch(records) => records.iter().fold(true, |ok, r| self.apply_redo(r) && ok),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{PieceCatalog, PieceDefinition};
    use crate::game::entity::EntityKind;

    #[test]
    fn test_transform_undo_redo() {
        let mut scene = Scene::new(PieceCatalog::new().with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE)));
        let piece = scene.spawn_piece("crate").expect("known piece");
        let old = scene.capture_transform(piece).expect("exists");
        scene.set_world_position(piece, Vec3::new(3.0, 0.0, 0.0));
        let new = scene.capture_transform(piece).expect("exists");
        let record = UndoRecord::Transformed { entity: piece, old, new };

        scene.apply_undo(&record);
        assert_eq!(scene.world_position(piece), Some(Vec3::ZERO));
        assert!(scene.apply_redo(&record));
        assert_eq!(scene.world_position(piece), Some(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_undo_placement_destroys() {
        let mut scene = Scene::new(PieceCatalog::new().with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE)));
        let piece = scene.spawn_piece("crate").expect("known piece");
        let record = UndoRecord::Batch(vec![UndoRecord::Placed { entity: piece }]);
        assert_eq!(record.entities(), vec![piece]);
        scene.apply_undo(&record);
        assert!(!scene.contains(piece));
        assert!(!scene.apply_redo(&record));
    }
}
