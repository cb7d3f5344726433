//! Placement Pipeline
//!
//! Moving an entity to a pointer target: restriction-aware snapping, the
//! grid memo, surface alignment and stacking onto overlapping neighbours.

use glam::{Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::game::entity::{EntityId, PlacementStatus};
use crate::game::restriction::SpaceRestriction;
use crate::game::snap::{SnapFrame, SnapPolicy, grid_memo, snap_position};
use crate::world::look_rotation;

use super::Scene;

/// How a placed entity settles onto what is already there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackMode {
    /// Stack onto anything whose bounds overlap
    Boundary,
    /// Stack only onto overlapping entities whose pivot is within the
    /// entity's smallest footprint
    Center,
    #[default]
    Disabled,
}

/// One call of the placement pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceRequest {
    pub target: Vec3,
    pub policy: SnapPolicy,
    /// Align the entity's up axis to this surface normal
    pub align_normal: Option<Vec3>,
    /// Snap in the parent set's frame instead of world axes
    pub local_space: bool,
    /// Added after snapping
    pub offset: Vec3,
    /// Update the grid memo and position-changed flag
    pub update_memo: bool,
}

impl PlaceRequest {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            policy: SnapPolicy::Default,
            align_normal: None,
            local_space: true,
            offset: Vec3::ZERO,
            update_memo: true,
        }
    }

    pub fn with_policy(mut self, policy: SnapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_normal(mut self, normal: Option<Vec3>) -> Self {
        self.align_normal = normal;
        self
    }

    pub fn in_local_space(mut self, local_space: bool) -> Self {
        self.local_space = local_space;
        self
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn without_memo(mut self) -> Self {
        self.update_memo = false;
        self
    }
}

impl Scene {
    /// World grid center of the entity's parent set, origin when top-level.
    pub fn grid_center(&self, id: EntityId) -> Vec3 {
        self.get(id)
            .and_then(|e| e.parent)
            .map(|parent| self.world_grid_center(parent))
            .unwrap_or(Vec3::ZERO)
    }

    /// Reference orientation for local-space snapping, from the parent set.
    pub fn local_space(&self, id: EntityId) -> Option<Quat> {
        let parent = self.get(id)?.parent?;
        self.set_local_space(parent)
    }

    /// Grid description for snapping `id`.
    pub fn snap_frame(&self, id: EntityId, local_space: bool) -> SnapFrame {
        let orientation = if local_space { self.local_space(id) } else { None };
        let grid_center = if orientation.is_some() {
            self.grid_center(id)
        } else {
            Vec3::ZERO
        };
        let world = self.world_frame(id).unwrap_or_default();
        let metrics = self.metrics(id);
        SnapFrame {
            cell: self.restricted_scale(id),
            grid_center,
            orientation,
            entity_forward: world.forward(),
            min_scale: metrics.map(|m| m.min_scale).unwrap_or(0.0),
        }
    }

    /// Run the placement pipeline. Returns the written world position, or
    /// `None` when the entity does not exist.
    pub fn place_at(&mut self, id: EntityId, request: PlaceRequest) -> Option<Vec3> {
        let own = self.get(id)?.snap;
        let restrictions = self.effective_restrictions(id);
        let local_space = request.local_space && restrictions.space != SpaceRestriction::WorldOnly;
        let policy = request.policy.resolve(own).restricted(restrictions.position);

        let frame = self.snap_frame(id, local_space);
        let placed = snap_position(request.target, policy, &frame);
        let position = placed + request.offset;
        self.set_world_position(id, position);

        if let Some(normal) = request.align_normal {
            self.align_to_surface(id, normal);
        }

        let entity = self.get_mut(id)?;
        if request.update_memo {
            entity.memo.last_grid_position = grid_memo(own, policy, placed, request.target, &frame);
            entity.memo.position_changed = entity.memo.last_position != Some(position);
            entity.memo.last_position = Some(position);
        }
        Some(position)
    }

    /// Turn the entity's up axis onto `normal` by replacing its base rotation.
    pub fn align_to_surface(&mut self, id: EntityId, normal: Vec3) {
        let Some(up_axis) = self.get(id).map(|e| e.up_axis) else {
            return;
        };
        let world_base = look_rotation(normal, Vec3::Y) * look_rotation(up_axis, Vec3::Y).inverse();
        let parent_rotation = self.parent_frame(id).rotation;
        if let Some(entity) = self.get_mut(id) {
            entity.set_base_rotation((parent_rotation.inverse() * world_base).normalize());
        }
    }

    // ========================================================================
    // STACKING
    // ========================================================================

    /// Whether `test` should stack onto `target`.
    ///
    /// With a `range`, the pivots must be closer than it and a
    /// boundary-defining entity only stacks onto other boundary definers.
    pub fn stack_test(&self, test: EntityId, target: EntityId, range: Option<f32>) -> bool {
        if test == target {
            return false;
        }
        let (Some(a), Some(b)) = (self.get(test), self.get(target)) else {
            return false;
        };
        if !b.active || b.status == PlacementStatus::Live {
            return false;
        }
        let (Some(test_bounds), Some(target_bounds)) = (self.world_bounds(test), self.world_bounds(target)) else {
            return false;
        };
        if !test_bounds.intersects(&target_bounds) {
            return false;
        }
        match range {
            None => true,
            Some(range) => {
                let (Some(pa), Some(pb)) = (self.world_position(test), self.world_position(target)) else {
                    return false;
                };
                pa.distance(pb) < range && (!a.defines_boundary() || b.defines_boundary())
            }
        }
    }

    /// Entities `id` may stack onto: its parent set's members, plus every
    /// top-level entity that is not one of its ancestors.
    pub fn stack_candidates(&self, id: EntityId) -> Vec<EntityId> {
        let ancestors = self.ancestors(id);
        let mut candidates: Vec<EntityId> = ancestors
            .first()
            .and_then(|parent| self.group(*parent))
            .map(|g| g.members.clone())
            .unwrap_or_default();
        candidates.extend(
            self.iter()
                .filter(|e| e.parent.is_none() && e.id != id && !ancestors.contains(&e.id))
                .map(|e| e.id),
        );
        candidates
    }

    /// Candidates that `id` currently overlaps under `mode`.
    pub fn overlapping(&self, id: EntityId, mode: StackMode) -> Vec<EntityId> {
        let range = match mode {
            StackMode::Disabled => return Vec::new(),
            StackMode::Boundary => None,
            StackMode::Center => self.metrics(id).map(|m| m.min_scale),
        };
        self.stack_candidates(id)
            .into_iter()
            .filter(|target| self.stack_test(id, *target, range))
            .collect()
    }

    /// Raise the entity onto the highest overlapping top. Returns whether it moved.
    pub fn stack_once(&mut self, id: EntityId, mode: StackMode) -> bool {
        let Some(position) = self.world_position(id) else {
            return false;
        };
        let highest = self
            .overlapping(id, mode)
            .iter()
            .filter_map(|target| self.world_bounds(*target))
            .map(|bounds| bounds.top())
            .fold(f32::NEG_INFINITY, f32::max);
        if highest > position.y {
            let request = PlaceRequest::new(Vec3::new(position.x, highest, position.z))
                .with_policy(SnapPolicy::FreeForm)
                .in_local_space(false)
                .without_memo();
            self.place_at(id, request);
            true
        } else {
            false
        }
    }

    /// Settle the entity after a placement. Stacking only re-runs when the
    /// last placement moved the entity; otherwise the previous stack height
    /// is reused. Returns the resulting height.
    pub fn auto_stack(&mut self, id: EntityId, mode: StackMode, iteration_limit: usize) -> Option<f32> {
        if mode == StackMode::Disabled {
            return self.world_position(id).map(|p| p.y);
        }
        let changed = self.get(id)?.memo.position_changed;
        if changed {
            let mut iterations = 0;
            while iterations < iteration_limit && self.stack_once(id, mode) {
                iterations += 1;
            }
            if iterations == iteration_limit {
                debug!("[Placement] Stacking of {} hit the iteration limit", id);
            }
            let y = self.world_position(id)?.y;
            self.get_mut(id)?.memo.last_y_stack = y;
        }

        let position = self.world_position(id)?;
        let y = self.get(id)?.memo.last_y_stack;
        self.set_world_position(id, Vec3::new(position.x, y, position.z));
        Some(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{PieceCatalog, PieceDefinition};
    use crate::game::entity::EntityKind;

    fn scene() -> Scene {
        Scene::new(
            PieceCatalog::new()
                .with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE))
                .with(PieceDefinition::new("foundation", EntityKind::Core, Vec3::new(2.0, 0.5, 2.0)))
                .with(PieceDefinition::new("wall", EntityKind::Structure, Vec3::new(2.0, 2.0, 0.2))),
        )
    }

    fn placed(scene: &mut Scene, piece: &str, at: Vec3) -> EntityId {
        let id = scene.spawn_piece(piece).expect("known piece");
        scene.set_world_position(id, at);
        scene.set_status(id, PlacementStatus::Placed);
        id
    }

    #[test]
    fn test_grid_locked_piece_snaps_to_center() {
        let mut scene = scene();
        let id = scene.spawn_piece("foundation").expect("known piece");
        let pos = scene
            .place_at(id, PlaceRequest::new(Vec3::new(0.3, 0.0, 3.6)).with_policy(SnapPolicy::FreeForm))
            .expect("exists");
        assert_eq!(pos, Vec3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn test_position_changed_flag() {
        let mut scene = scene();
        let id = scene.spawn_piece("crate").expect("known piece");
        scene.place_at(id, PlaceRequest::new(Vec3::ZERO));
        assert!(scene.get(id).expect("exists").memo.position_changed);
        scene.place_at(id, PlaceRequest::new(Vec3::ZERO));
        assert!(!scene.get(id).expect("exists").memo.position_changed);
    }

    #[test]
    fn test_offset_is_added_after_snapping() {
        let mut scene = scene();
        let id = scene.spawn_piece("foundation").expect("known piece");
        let pos = scene
            .place_at(id, PlaceRequest::new(Vec3::new(0.9, 0.0, 0.9)).with_offset(Vec3::new(0.0, 2.0, 0.0)))
            .expect("exists");
        assert_eq!(pos, Vec3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_stacks_onto_overlapping_top() {
        let mut scene = scene();
        placed(&mut scene, "crate", Vec3::ZERO);
        let id = scene.spawn_piece("crate").expect("known piece");
        scene.place_at(id, PlaceRequest::new(Vec3::ZERO));
        let y = scene.auto_stack(id, StackMode::Boundary, 64);
        assert_eq!(y, Some(1.0));
    }

    #[test]
    fn test_disabled_stacking_leaves_height() {
        let mut scene = scene();
        placed(&mut scene, "crate", Vec3::ZERO);
        let id = scene.spawn_piece("crate").expect("known piece");
        scene.place_at(id, PlaceRequest::new(Vec3::ZERO));
        assert_eq!(scene.auto_stack(id, StackMode::Disabled, 64), Some(0.0));
    }

    #[test]
    fn test_center_mode_respects_boundary_rule() {
        let mut scene = scene();
        placed(&mut scene, "crate", Vec3::ZERO);
        // A wall defines the boundary and does not stack onto a crate in Center mode
        let wall = scene.spawn_piece("wall").expect("known piece");
        scene.place_at(wall, PlaceRequest::new(Vec3::ZERO).with_policy(SnapPolicy::FreeForm));
        assert!(scene.overlapping(wall, StackMode::Center).is_empty());
        assert_eq!(scene.overlapping(wall, StackMode::Boundary).len(), 1);
    }

    #[test]
    fn test_stack_height_reused_when_unchanged() {
        let mut scene = scene();
        let below = placed(&mut scene, "crate", Vec3::ZERO);
        let id = scene.spawn_piece("crate").expect("known piece");
        scene.place_at(id, PlaceRequest::new(Vec3::ZERO));
        scene.auto_stack(id, StackMode::Boundary, 64);

        // Same pointer target: no re-stack, previous height kept even if the floor is gone
        scene.destroy(below);
        scene.place_at(id, PlaceRequest::new(Vec3::ZERO));
        assert_eq!(scene.auto_stack(id, StackMode::Boundary, 64), Some(1.0));
    }

    #[test]
    fn test_align_to_flat_ground_is_identity() {
        let mut scene = scene();
        let id = scene.spawn_piece("crate").expect("known piece");
        scene.align_to_surface(id, Vec3::Y);
        let rotation = scene.world_frame(id).expect("exists").rotation;
        assert!(rotation.dot(Quat::IDENTITY).abs() > 1.0 - 1e-6);
    }
}
