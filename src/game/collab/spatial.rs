//! Spatial Queries
//!
//! Ray casts and box overlaps against placed entities. [`SceneQuery`]
//! answers them directly from scene bounds with slab tests, which is all
//! the engine needs outside of a physics backend.

use std::ops::BitOr;

use glam::Vec3;

use crate::game::entity::{EntityId, PlacableEntity, PlacementStatus};
use crate::game::scene::Scene;
use crate::physics::{aabb_overlap, ray_bounds_intersect};
use crate::world::AxisBounds;

/// Which entities a query sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    /// Placed and editable entities
    pub const COMMITTED: LayerMask = LayerMask(1);
    /// Live entities still following the pointer
    pub const GHOST: LayerMask = LayerMask(1 << 1);
    pub const ALL: LayerMask = LayerMask(0b11);

    /// Layer an entity currently lives on.
    pub fn of(entity: &PlacableEntity) -> LayerMask {
        match entity.status {
            PlacementStatus::Live => LayerMask::GHOST,
            PlacementStatus::Editable | PlacementStatus::Placed => LayerMask::COMMITTED,
        }
    }

    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    pub position: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

pub trait SpatialQuery {
    /// Hits along `direction` within `max_distance`, nearest first.
    fn ray_cast(&self, scene: &Scene, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Vec<RayHit>;

    /// Entities whose bounds overlap `region`.
    fn overlap_box(&self, scene: &Scene, region: &AxisBounds, mask: LayerMask) -> Vec<EntityId>;
}

/// Brute-force queries over the scene's piece bounds. Sets are skipped; their
/// members are hit instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneQuery;

impl SceneQuery {
    fn candidates<'a>(scene: &'a Scene, mask: LayerMask) -> impl Iterator<Item = (EntityId, AxisBounds)> + 'a {
        scene
            .iter()
            .filter(move |e| !e.is_set() && e.active && mask.contains(LayerMask::of(e)))
            .filter_map(move |e| scene.world_bounds(e.id).map(|b| (e.id, b)))
    }
}

impl SpatialQuery for SceneQuery {
    fn ray_cast(&self, scene: &Scene, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Vec<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Vec::new();
        }
        let mut hits: Vec<RayHit> = Self::candidates(scene, mask)
            // A ray starting inside a box does not report that box
            .filter(|(_, bounds)| !bounds.contains_point(origin))
            .filter_map(|(entity, bounds)| {
                let hit = ray_bounds_intersect(origin, direction, &bounds)?;
                (hit.distance <= max_distance).then_some(RayHit {
                    entity,
                    position: hit.position,
                    normal: hit.normal,
                    distance: hit.distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn overlap_box(&self, scene: &Scene, region: &AxisBounds, mask: LayerMask) -> Vec<EntityId> {
        if region.is_uninitialized() {
            return Vec::new();
        }
        let (min, max) = region.world_aabb();
        Self::candidates(scene, mask)
            .filter(|(_, bounds)| {
                let (other_min, other_max) = bounds.world_aabb();
                aabb_overlap(min, max, other_min, other_max)
            })
            .map(|(id, _)| id)
            .collect()
    }
}
