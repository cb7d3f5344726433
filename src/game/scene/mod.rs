//! Scene Arena
//!
//! Owns every entity and set. Entities refer to each other by id; transforms
//! are local to the parent set and resolved to world space on demand, so
//! moving a set moves its members without touching them.

pub mod history;
pub mod placement;

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use log::{debug, warn};

use crate::world::{AxisBounds, Frame};

use super::catalog::{PieceCatalog, ScaleMetrics};
use super::entity::{EntityId, PlacableEntity, PlacementStatus};
use super::error::{PlacementError, Result};
use super::group::EntityGroup;
use super::restriction::RestrictionSet;
use super::stroke::ConnectionDiff;

pub use history::{LocalTransform, UndoRecord};
pub use placement::{PlaceRequest, StackMode};

#[derive(Debug, Clone, Default)]
pub struct Scene {
    entities: BTreeMap<EntityId, PlacableEntity>,
    groups: BTreeMap<EntityId, EntityGroup>,
    catalog: PieceCatalog,
    next_id: u64,
}

impl Scene {
    pub fn new(catalog: PieceCatalog) -> Self {
        Self {
            entities: BTreeMap::new(),
            groups: BTreeMap::new(),
            catalog,
            next_id: 1,
        }
    }

    pub fn catalog(&self) -> &PieceCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PieceCatalog {
        &mut self.catalog
    }

    pub(crate) fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Spawn a live, parentless entity for a catalog piece.
    pub fn spawn_piece(&mut self, piece_id: &str) -> Result<EntityId> {
        let piece = self
            .catalog
            .get(piece_id)
            .cloned()
            .ok_or_else(|| PlacementError::UnknownPiece(piece_id.to_string()))?;
        let id = self.allocate_id();
        self.entities.insert(id, PlacableEntity::from_piece(id, &piece));
        debug!("[Scene] Spawned {} `{}`", id, piece_id);
        Ok(id)
    }

    pub(crate) fn insert_entity(&mut self, entity: PlacableEntity) {
        self.entities.insert(entity.id, entity);
    }

    pub(crate) fn insert_group(&mut self, group: EntityGroup) {
        self.groups.insert(group.id, group);
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    pub fn get(&self, id: EntityId) -> Option<&PlacableEntity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut PlacableEntity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacableEntity> {
        self.entities.values()
    }

    pub fn group(&self, id: EntityId) -> Option<&EntityGroup> {
        self.groups.get(&id)
    }

    pub(crate) fn group_mut(&mut self, id: EntityId) -> Option<&mut EntityGroup> {
        self.groups.get_mut(&id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &EntityGroup> {
        self.groups.values()
    }

    /// Parent chain from the direct parent upwards.
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|e| e.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent).and_then(|e| e.parent);
        }
        chain
    }

    // ========================================================================
    // RESTRICTIONS AND METRICS
    // ========================================================================

    /// Declared restrictions tightened by every ancestor set's declared minimum.
    pub fn effective_restrictions(&self, id: EntityId) -> RestrictionSet {
        let Some(entity) = self.get(id) else {
            return RestrictionSet::UNRESTRICTED;
        };
        self.ancestors(id)
            .iter()
            .filter_map(|a| self.group(*a))
            .fold(entity.restrictions, |acc, group| acc.tightened(&group.declared))
    }

    /// Scale, min scale and real scale at the entity's world scale.
    pub fn metrics(&self, id: EntityId) -> Option<ScaleMetrics> {
        let frame = self.world_frame(id)?;
        self.get(id).map(|e| e.metrics(frame.scale))
    }

    /// Grid cell the entity snaps to.
    pub fn restricted_scale(&self, id: EntityId) -> f32 {
        let scale = self.metrics(id).map(|m| m.scale).unwrap_or(0.0);
        self.effective_restrictions(id).restricted_scale(scale)
    }

    // ========================================================================
    // TRANSFORMS
    // ========================================================================

    pub fn local_frame(&self, id: EntityId) -> Option<Frame> {
        let restrictions = self.effective_restrictions(id);
        self.get(id).map(|e| e.local_frame(&restrictions))
    }

    /// World frame of the parent, identity for top-level entities.
    pub fn parent_frame(&self, id: EntityId) -> Frame {
        self.get(id)
            .and_then(|e| e.parent)
            .and_then(|p| self.world_frame(p))
            .unwrap_or(Frame::IDENTITY)
    }

    pub fn world_frame(&self, id: EntityId) -> Option<Frame> {
        let local = self.local_frame(id)?;
        Some(self.parent_frame(id).compose(&local))
    }

    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        self.world_frame(id).map(|f| f.position)
    }

    /// Bounds in world space. Uninitialized piece bounds are logged and
    /// returned as-is (they never overlap anything).
    pub fn world_bounds(&self, id: EntityId) -> Option<AxisBounds> {
        let frame = self.world_frame(id)?;
        let entity = self.get(id)?;
        let bounds = entity.bounds_in(frame);
        if bounds.is_uninitialized() && !entity.is_set() {
            warn!("[Scene] Bounds of {} queried before a footprint was set", id);
        }
        Some(bounds)
    }

    pub fn set_world_position(&mut self, id: EntityId, position: Vec3) {
        let local = self.parent_frame(id).inverse_transform_point(position);
        if let Some(entity) = self.get_mut(id) {
            entity.position = local;
        }
    }

    /// Write a full world transform, keeping the rotation offset.
    pub fn set_world_frame(&mut self, id: EntityId, world: &Frame) {
        let local = self.parent_frame(id).relative(world);
        if let Some(entity) = self.get_mut(id) {
            entity.position = local.position;
            entity.rotation.base = local.rotation * entity.rotation.offset.inverse();
            entity.scale = local.scale;
        }
    }

    /// Set the world rotation, keeping world position and scale.
    pub fn set_world_rotation(&mut self, id: EntityId, rotation: Quat) {
        if let Some(mut world) = self.world_frame(id) {
            world.rotation = rotation;
            self.set_world_frame(id, &world);
        }
    }

    /// Move an entity under a new parent without changing its world transform.
    pub fn reparent(&mut self, id: EntityId, parent: Option<EntityId>) {
        let Some(world) = self.world_frame(id) else {
            return;
        };
        if let Some(entity) = self.get_mut(id) {
            entity.parent = parent;
        }
        self.set_world_frame(id, &world);
    }

    pub fn set_status(&mut self, id: EntityId, status: PlacementStatus) {
        if let Some(entity) = self.get_mut(id) {
            entity.status = status;
        }
        let members = self.group(id).map(|g| g.members.clone()).unwrap_or_default();
        for member in members {
            self.set_status(member, status);
        }
    }

    pub fn set_active(&mut self, id: EntityId, active: bool) {
        if let Some(entity) = self.get_mut(id) {
            entity.active = active;
        }
    }

    // ========================================================================
    // DESTRUCTION AND CLONING
    // ========================================================================

    /// Destroy an entity (and a set's members), detach it from its parent
    /// set and from every stroke neighbour.
    ///
    /// Returns the `removed` diffs of the neighbours that lost a connection.
    pub fn destroy(&mut self, id: EntityId) -> Vec<ConnectionDiff> {
        if !self.contains(id) {
            debug!("[Scene] Destroy of unknown entity {}", id);
            return Vec::new();
        }
        if let Some(parent) = self.get(id).and_then(|e| e.parent) {
            self.remove_member(parent, id);
        }
        self.destroy_subtree(id)
    }

    fn destroy_subtree(&mut self, id: EntityId) -> Vec<ConnectionDiff> {
        let mut diffs = self.remove_from_connections(id);
        if let Some(group) = self.groups.remove(&id) {
            for member in group.members.into_iter().chain(group.placing) {
                diffs.extend(self.destroy_subtree(member));
            }
        }
        self.entities.remove(&id);
        debug!("[Scene] Destroyed {}", id);
        diffs
    }

    /// Deep copy of an entity at the same world transform, without a parent.
    ///
    /// Clones of sets get fresh member ids; stroke connections are not copied.
    pub fn duplicate(&mut self, id: EntityId) -> Option<EntityId> {
        let world = self.world_frame(id)?;
        let clone = self.clone_subtree(id, None)?;
        self.set_world_frame(clone, &world);
        Some(clone)
    }

    fn clone_subtree(&mut self, id: EntityId, parent: Option<EntityId>) -> Option<EntityId> {
        let mut entity = self.get(id)?.clone();
        let new_id = self.allocate_id();
        entity.id = new_id;
        entity.parent = parent;
        if let Some(stroke) = entity.stroke.as_mut() {
            stroke.connected.clear();
        }
        self.entities.insert(new_id, entity);

        if let Some(group) = self.group(id).cloned() {
            let mut members = Vec::with_capacity(group.members.len());
            for member in &group.members {
                if let Some(cloned) = self.clone_subtree(*member, Some(new_id)) {
                    members.push(cloned);
                }
            }
            self.groups.insert(
                new_id,
                EntityGroup {
                    id: new_id,
                    members,
                    placing: None,
                    editing: false,
                    ..group
                },
            );
        }
        Some(new_id)
    }
}
