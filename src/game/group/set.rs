//! Set Operations
//!
//! Membership, grid center, restriction and bounds maintenance for sets.

use glam::{Quat, Vec3};
use log::debug;

use crate::game::entity::{EntityId, PlacableEntity, PlacementStatus};
use crate::game::restriction::{RestrictionSet, SpaceRestriction};
use crate::game::scene::{LocalTransform, Scene, StackMode};
use crate::world::{AxisBounds, Frame, flatten_to_yaw, round_to_grid_local};

use super::EntityGroup;

/// Result of closing a set's authoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct SetFinalize {
    /// False when the set ended up empty and was destroyed
    pub survived: bool,
    /// Inactive members that were destroyed
    pub dropped: Vec<EntityId>,
}

impl Scene {
    /// Create an empty set at the origin.
    pub fn create_set(&mut self, name: &str) -> EntityId {
        let id = self.allocate_id();
        self.insert_entity(PlacableEntity::new_set(id));
        self.insert_group(EntityGroup::new(id, name));
        debug!("[Set] Created {} `{}`", id, name);
        id
    }

    pub fn set_name(&mut self, set: EntityId, name: &str) {
        if let Some(group) = self.group_mut(set) {
            group.name = name.to_string();
        }
    }

    pub fn is_member(&self, set: EntityId, id: EntityId) -> bool {
        self.group(set).is_some_and(|g| g.contains(id))
    }

    /// Add `piece` to `set`, keeping its world transform.
    pub fn add_member(&mut self, set: EntityId, piece: EntityId) -> bool {
        if self.group(set).is_none() || !self.contains(piece) || set == piece {
            debug!("[Set] Cannot add {} to {}", piece, set);
            return false;
        }
        self.reparent(piece, Some(set));
        self.attach(set, piece);
        true
    }

    /// Add `piece` to `set` at a parent-relative transform (used when loading).
    ///
    /// The set's frame, grid center and bounds are left alone so later
    /// members land in the same frame as earlier ones. The loader refreshes
    /// the set once every member is in.
    pub fn add_member_at(&mut self, set: EntityId, piece: EntityId, transform: &LocalTransform) -> bool {
        if self.group(set).is_none() || !self.contains(piece) || set == piece {
            return false;
        }
        if let Some(entity) = self.get_mut(piece) {
            entity.parent = Some(set);
            entity.position = transform.position;
            entity.rotation = transform.rotation;
            entity.scale = transform.scale;
        }
        self.link_member(set, piece);
        true
    }

    fn attach(&mut self, set: EntityId, piece: EntityId) {
        self.link_member(set, piece);
        if self.origin_piece(set) == Some(piece) {
            self.calculate_grid_center(set);
        }
        self.recompute_restrictions(set);
        self.recompute_bounds(set, true);
    }

    /// Membership and status only.
    fn link_member(&mut self, set: EntityId, piece: EntityId) {
        let mut editing = false;
        if let Some(group) = self.group_mut(set) {
            if group.placing == Some(piece) {
                group.placing = None;
            }
            if !group.members.contains(&piece) {
                group.members.push(piece);
            }
            editing = group.editing;
        }
        let status = if editing {
            PlacementStatus::Editable
        } else {
            PlacementStatus::Placed
        };
        self.set_status(piece, status);
    }

    /// Remove `piece` from `set`. Returns false when the set was emptied
    /// outside authoring mode and destroyed with it.
    pub fn remove_member(&mut self, set: EntityId, piece: EntityId) -> bool {
        let origin_before = self.origin_piece(set);
        let Some(group) = self.group_mut(set) else {
            return false;
        };
        if group.placing == Some(piece) {
            group.placing = None;
        }
        let was_member = group.members.contains(&piece);
        group.members.retain(|m| *m != piece);
        let editing = group.editing;
        let empty = group.members.is_empty();

        if self.get(piece).and_then(|e| e.parent) == Some(set) {
            self.reparent(piece, None);
        }
        if !was_member {
            return true;
        }
        if origin_before == Some(piece) {
            self.calculate_grid_center(set);
        }
        if !editing && empty {
            debug!("[Set] {} emptied, destroying", set);
            self.destroy(set);
            return false;
        }
        self.recompute_restrictions(set);
        self.recompute_bounds(set, true);
        true
    }

    /// First active member that defines the boundary.
    pub fn origin_piece(&self, set: EntityId) -> Option<EntityId> {
        self.group(set)?
            .members
            .iter()
            .copied()
            .find(|m| self.get(*m).is_some_and(|e| e.active && e.defines_boundary()))
    }

    pub fn world_grid_center(&self, set: EntityId) -> Vec3 {
        let local = self.group(set).map(|g| g.grid_center).unwrap_or(Vec3::ZERO);
        self.world_frame(set)
            .map(|frame| frame.transform_point(local))
            .unwrap_or(local)
    }

    /// Reference orientation members snap in: the set's frame when anchored
    /// by an origin piece, else the first member's, else the placing entity's.
    pub fn set_local_space(&self, set: EntityId) -> Option<Quat> {
        let group = self.group(set)?;
        let reference = if self.origin_piece(set).is_some() {
            Some(set)
        } else {
            group.members.first().copied().or(group.placing)
        };
        reference.and_then(|id| self.world_frame(id)).map(|f| f.rotation)
    }

    /// Re-anchor the grid: the origin piece's memo (and yaw), else the
    /// placing entity's memo, else the set origin when empty.
    pub fn calculate_grid_center(&mut self, set: EntityId) {
        let Some(group) = self.group(set) else {
            return;
        };
        let (placing, empty) = (group.placing, group.members.is_empty());
        let anchor_of = |scene: &Scene, id: EntityId| {
            scene.get(id).and_then(|e| {
                e.memo
                    .last_position
                    .map(|_| e.memo.last_grid_position)
                    .or_else(|| scene.world_position(id))
            })
        };

        if let Some(origin) = self.origin_piece(set) {
            if let Some(rotation) = self.world_frame(origin).map(|f| flatten_to_yaw(f.rotation)) {
                self.rotate_set_in_place(set, rotation);
            }
            if let Some(anchor) = anchor_of(self, origin) {
                self.set_world_grid_center(set, anchor);
            }
        } else if let Some(placing) = placing {
            if let Some(anchor) = anchor_of(self, placing) {
                self.set_world_grid_center(set, anchor);
            }
        } else if empty {
            if let Some(group) = self.group_mut(set) {
                group.grid_center = Vec3::ZERO;
            }
        }
    }

    fn set_world_grid_center(&mut self, set: EntityId, world: Vec3) {
        let local = self
            .world_frame(set)
            .map(|f| f.inverse_transform_point(world))
            .unwrap_or(world);
        if let Some(group) = self.group_mut(set) {
            group.grid_center = local;
        }
    }

    /// Turn the set to `rotation` while members and the grid center keep
    /// their world transforms.
    fn rotate_set_in_place(&mut self, set: EntityId, rotation: Quat) {
        let Some(mut frame) = self.world_frame(set) else {
            return;
        };
        frame.rotation = rotation;
        self.move_set_frame(set, &frame);
    }

    /// Move the set's own frame without moving anything it contains.
    fn move_set_frame(&mut self, set: EntityId, frame: &Frame) {
        let Some(group) = self.group(set) else {
            return;
        };
        let children: Vec<EntityId> = group.members.iter().copied().chain(group.placing).collect();
        let grid_center = self.world_grid_center(set);
        let frames: Vec<(EntityId, Frame)> = children
            .into_iter()
            .filter_map(|id| self.world_frame(id).map(|f| (id, f)))
            .collect();

        self.set_world_frame(set, frame);
        for (id, world) in &frames {
            self.set_world_frame(*id, world);
        }
        self.set_world_grid_center(set, grid_center);
    }

    /// Aggregate member restrictions into the set.
    pub fn recompute_restrictions(&mut self, set: EntityId) {
        let Some(group) = self.group(set) else {
            return;
        };
        let declared = group.declared;
        let members: Vec<RestrictionSet> = group
            .members
            .iter()
            .filter_map(|m| self.get(*m))
            .filter(|e| e.active)
            .map(|e| e.restrictions)
            .collect();
        let aggregated = RestrictionSet::aggregate(members.iter()).tightened(&declared);
        if let Some(entity) = self.get_mut(set) {
            entity.restrictions = aggregated;
        }
    }

    /// Recompute the set's bounds from its active members. With
    /// `update_pivot`, the set origin first moves to the bottom center of
    /// the bounds (grid-rounded for world-locked grids).
    pub fn recompute_bounds(&mut self, set: EntityId, update_pivot: bool) {
        let Some(group) = self.group(set) else {
            return;
        };
        let Some(frame) = self.world_frame(set) else {
            return;
        };
        let mut merged = AxisBounds::uninitialized(frame);
        for member in &group.members {
            if !self.get(*member).is_some_and(|e| e.active) {
                continue;
            }
            if let Some(bounds) = self.world_bounds(*member) {
                merged.encapsulate(&bounds);
            }
        }

        if merged.is_uninitialized() {
            if let Some(entity) = self.get_mut(set) {
                entity.bound_size = Vec3::ZERO;
                entity.bounds_offset = Vec3::ZERO;
            }
            return;
        }

        let center_world = frame.transform_point(merged.center);
        if update_pivot {
            let mut pivot_local = merged.center;
            pivot_local.y = merged.min().y;
            let mut pivot = frame.transform_point(pivot_local);
            let restrictions = self.get(set).map(|e| e.restrictions).unwrap_or_default();
            let grid = restrictions.position_grid;
            if grid > 0.0 && restrictions.space == SpaceRestriction::WorldOnly {
                let half = grid * 0.5;
                pivot = round_to_grid_local(grid, pivot, Quat::IDENTITY, Vec3::ZERO, Vec3::new(half, 0.0, half));
            }
            self.move_set_frame(set, &Frame { position: pivot, ..frame });
            debug!("[Set] Pivot of {} moved to {:?}", set, pivot);
        }

        let new_frame = self.world_frame(set).unwrap_or(frame);
        if let Some(entity) = self.get_mut(set) {
            entity.bound_size = merged.size;
            entity.bounds_offset = new_frame.inverse_transform_point(center_world);
        }
    }

    /// Members of `set` that `piece` overlaps under `mode`.
    pub fn overlapping_members(&self, set: EntityId, piece: EntityId, mode: StackMode) -> Vec<EntityId> {
        let range = match mode {
            StackMode::Disabled => return Vec::new(),
            StackMode::Boundary => None,
            StackMode::Center => self.metrics(piece).map(|m| m.min_scale),
        };
        self.group(set)
            .map(|g| {
                g.members
                    .iter()
                    .copied()
                    .filter(|m| self.stack_test(piece, *m, range))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The set's bounds grown to include `piece`, or just the piece's bounds
    /// while the set has no origin piece.
    pub fn bounds_including(&self, set: EntityId, piece: EntityId) -> Option<AxisBounds> {
        let piece_bounds = self.world_bounds(piece)?;
        if self.origin_piece(set).is_none() {
            return Some(piece_bounds);
        }
        let set_bounds = self.world_bounds(set)?;
        Some(set_bounds.encapsulated(&piece_bounds))
    }

    /// Register the entity being placed into `set`. It follows the set's
    /// frame but is not a member until committed.
    pub fn register_placing(&mut self, set: EntityId, piece: EntityId) {
        if self.group(set).is_none() || !self.contains(piece) {
            return;
        }
        self.reparent(piece, Some(set));
        if let Some(group) = self.group_mut(set) {
            group.placing = Some(piece);
        }
    }

    pub fn deregister_placing(&mut self, set: EntityId) -> Option<EntityId> {
        self.group_mut(set)?.placing.take()
    }

    /// Enter authoring mode: an empty set survives and members are editable.
    pub fn initialize_editable(&mut self, set: EntityId) {
        if let Some(group) = self.group_mut(set) {
            group.editing = true;
        }
        let members = self.group(set).map(|g| g.members.clone()).unwrap_or_default();
        for member in members {
            self.set_status(member, PlacementStatus::Editable);
        }
    }

    /// Leave authoring mode. Inactive members are destroyed; an empty set
    /// is destroyed as well.
    pub fn finalize(&mut self, set: EntityId) -> SetFinalize {
        let Some(group) = self.group_mut(set) else {
            return SetFinalize {
                survived: false,
                dropped: Vec::new(),
            };
        };
        group.editing = false;
        let members = group.members.clone();

        let dropped: Vec<EntityId> = members
            .into_iter()
            .filter(|m| self.get(*m).is_some_and(|e| !e.active))
            .collect();
        for member in &dropped {
            if let Some(group) = self.group_mut(set) {
                group.members.retain(|m| m != member);
            }
            self.destroy(*member);
        }

        if self.group(set).is_none_or(|g| g.is_empty()) {
            debug!("[Set] {} finalized empty, destroying", set);
            self.destroy(set);
            return SetFinalize { survived: false, dropped };
        }

        self.recompute_restrictions(set);
        self.recompute_bounds(set, true);
        self.set_status(set, PlacementStatus::Placed);
        SetFinalize { survived: true, dropped }
    }
}
