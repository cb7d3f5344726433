//! Connection Graph
//!
//! Adjacency between placed connectors. A neighbour counts as connected only
//! when a probe in direction `d` hits a same-category connector that itself
//! lists `-d` among its world directions. Reconciliation recomputes the set
//! from scratch and returns what changed instead of notifying anyone, so
//! callers decide what to do with the diffs.

use std::collections::{BTreeSet, VecDeque};

use glam::Vec3;
use log::debug;

use crate::game::collab::{LayerMask, SpatialQuery};
use crate::game::entity::EntityId;
use crate::game::scene::Scene;

use super::archetype::StrokeCategory;
use super::direction::{ConnectionDirection, to_world};

/// Change of one connector's neighbour set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDiff {
    pub entity: EntityId,
    pub added: BTreeSet<EntityId>,
    pub removed: BTreeSet<EntityId>,
}

impl ConnectionDiff {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// First connector along `direction` that accepts a connection back.
pub fn check_for_connection(
    scene: &Scene,
    spatial: &dyn SpatialQuery,
    origin: Vec3,
    distance: f32,
    category: StrokeCategory,
    direction: ConnectionDirection,
    exclude: Option<EntityId>,
) -> Option<EntityId> {
    let wanted = direction.inverse();
    spatial
        .ray_cast(scene, origin, direction.vector(), distance, LayerMask::ALL)
        .into_iter()
        .filter(|hit| Some(hit.entity) != exclude)
        .find(|hit| {
            scene.get(hit.entity).is_some_and(|e| {
                e.stroke.as_ref().is_some_and(|s| s.category == category)
                    && scene.world_stroke_directions(hit.entity).contains(&wanted)
            })
        })
        .map(|hit| hit.entity)
}

/// Connected neighbours around `origin`, probed front, back, right, left.
pub fn connected_neighbours(
    scene: &Scene,
    spatial: &dyn SpatialQuery,
    origin: Vec3,
    distance: f32,
    category: StrokeCategory,
    exclude: Option<EntityId>,
) -> Vec<(ConnectionDirection, EntityId)> {
    ConnectionDirection::ALL
        .iter()
        .filter_map(|dir| {
            check_for_connection(scene, spatial, origin, distance, category, *dir, exclude).map(|id| (*dir, id))
        })
        .collect()
}

impl Scene {
    /// A connector's canonical directions turned by its world yaw.
    pub fn world_stroke_directions(&self, id: EntityId) -> Vec<ConnectionDirection> {
        let (Some(entity), Some(frame)) = (self.get(id), self.world_frame(id)) else {
            return Vec::new();
        };
        entity
            .stroke
            .as_ref()
            .map(|s| to_world(&s.directions, frame.rotation))
            .unwrap_or_default()
    }

    /// Current neighbours of a connector.
    pub fn connections(&self, id: EntityId) -> Vec<EntityId> {
        self.get(id)
            .and_then(|e| e.stroke.as_ref())
            .map(|s| s.connected.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Recompute a connector's neighbours and mirror the change onto them.
    ///
    /// Returns the connector's own diff first, then one per neighbour that
    /// gained or lost it. Empty diffs are left out, so calling this twice
    /// without a scene change returns nothing the second time.
    pub fn reconcile_connections(&mut self, id: EntityId, spatial: &dyn SpatialQuery, distance: f32) -> Vec<ConnectionDiff> {
        let Some(category) = self.get(id).and_then(|e| e.stroke.as_ref()).map(|s| s.category) else {
            return Vec::new();
        };
        let Some(origin) = self.world_bounds(id).map(|b| b.world_center()) else {
            return Vec::new();
        };
        let current: BTreeSet<EntityId> = connected_neighbours(self, spatial, origin, distance, category, Some(id))
            .into_iter()
            .map(|(_, neighbour)| neighbour)
            .collect();
        let previous: BTreeSet<EntityId> = self.connections(id).into_iter().collect();

        let mut own = ConnectionDiff::new(id);
        own.added = current.difference(&previous).copied().collect();
        own.removed = previous.difference(&current).copied().collect();

        let mut diffs = Vec::with_capacity(1 + own.added.len() + own.removed.len());
        let mut neighbour_diffs = Vec::new();
        for neighbour in &own.added {
            if self.link_mut(*neighbour).is_some_and(|set| set.insert(id)) {
                let mut diff = ConnectionDiff::new(*neighbour);
                diff.added.insert(id);
                neighbour_diffs.push(diff);
            }
        }
        for neighbour in &own.removed {
            if self.link_mut(*neighbour).is_some_and(|set| set.remove(&id)) {
                let mut diff = ConnectionDiff::new(*neighbour);
                diff.removed.insert(id);
                neighbour_diffs.push(diff);
            }
        }
        if let Some(set) = self.link_mut(id) {
            *set = current;
        }

        if !own.is_empty() {
            debug!(
                "[Stroke] {} connections: +{} -{}",
                id,
                own.added.len(),
                own.removed.len()
            );
            diffs.push(own);
        }
        diffs.extend(neighbour_diffs);
        diffs
    }

    /// Reconcile `ids`, then every neighbour a diff names, until nothing
    /// changes. Each connector is reconciled at most once.
    pub fn reconcile_around(&mut self, ids: &[EntityId], spatial: &dyn SpatialQuery, distance: f32) -> Vec<ConnectionDiff> {
        let mut queue: VecDeque<EntityId> = ids.iter().copied().collect();
        let mut visited = BTreeSet::new();
        let mut diffs = Vec::new();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            for diff in self.reconcile_connections(id, spatial, distance) {
                if diff.entity != id && !visited.contains(&diff.entity) {
                    queue.push_back(diff.entity);
                }
                diffs.push(diff);
            }
        }
        diffs
    }

    /// Drop a connector from every neighbour's set and clear its own.
    /// Returns one `removed` diff per neighbour.
    pub fn remove_from_connections(&mut self, id: EntityId) -> Vec<ConnectionDiff> {
        let neighbours = self.connections(id);
        let mut diffs = Vec::with_capacity(neighbours.len());
        for neighbour in neighbours {
            if self.link_mut(neighbour).is_some_and(|set| set.remove(&id)) {
                let mut diff = ConnectionDiff::new(neighbour);
                diff.removed.insert(id);
                diffs.push(diff);
            }
        }
        if let Some(set) = self.link_mut(id) {
            set.clear();
        }
        diffs
    }

    fn link_mut(&mut self, id: EntityId) -> Option<&mut BTreeSet<EntityId>> {
        self.get_mut(id).and_then(|e| e.stroke.as_mut()).map(|s| &mut s.connected)
    }
}
