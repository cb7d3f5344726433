//! Stroke Paths
//!
//! A dragged stroke is sampled at the connector spacing along the dominant
//! horizontal axis of the drag. Every sample is then resolved on its own:
//! which sides connect (to the previous/next sample of the same drag, or to
//! a placed connector beside it), which archetype that implies, and the yaw
//! that turns the archetype's canonical directions onto the required ones.
//!
//! Connectivity along the path is kept in a flat array of `3n + 2` flags.
//! Sample `i` sits at `p = 2 + 3i`; `p ± 1` are its right/left side probes,
//! `p ± 3` are the neighbouring samples, and the two ends hold the probes
//! behind the first and ahead of the last sample.

use glam::{Quat, Vec3};
use log::debug;

use crate::game::collab::{LayerMask, SpatialQuery, TerrainProvider};
use crate::game::entity::{EntityId, EntityKind};
use crate::game::scene::Scene;
use crate::world::{AxisBounds, Frame, look_rotation};

use super::archetype::{StrokeCategory, StrokeType, classify, match_angle};
use super::direction::{ConnectionDirection, to_world};
use super::graph::check_for_connection;

/// One sample along a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub position: Vec3,
    /// Ground slope under the sample in degrees
    pub slope: f32,
}

/// How a planned point is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointMarker {
    /// A connector will be placed here
    Ghost,
    /// An existing connector here will be replaced
    Delete,
    /// Nothing can be placed here
    Blocked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokePoint {
    pub position: Vec3,
    pub placeable: bool,
    /// Required connection directions in world space
    pub connections: Vec<ConnectionDirection>,
    /// `None` when no catalog piece exists for the connectivity
    pub archetype: Option<StrokeType>,
    /// Yaw in degrees for the archetype piece
    pub yaw: i32,
    /// Same-category connectors already occupying the point
    pub overlapping: Vec<EntityId>,
}

impl StrokePoint {
    pub fn will_place(&self) -> bool {
        self.placeable && self.archetype.is_some()
    }

    pub fn marker(&self) -> PointMarker {
        if !self.will_place() {
            PointMarker::Blocked
        } else if self.overlapping.is_empty() {
            PointMarker::Ghost
        } else {
            PointMarker::Delete
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y((self.yaw as f32).to_radians())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokePlan {
    pub category: StrokeCategory,
    /// Reference rotation of the drag (looking from first to last sample)
    pub rotation: Quat,
    pub points: Vec<StrokePoint>,
}

impl StrokePlan {
    /// Number of connectors a commit would create.
    pub fn placement_count(&self) -> usize {
        self.points.iter().filter(|p| p.will_place()).count()
    }

    /// Connectors a commit would remove, without duplicates.
    pub fn deletions(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.points.iter().flat_map(|p| p.overlapping.iter().copied()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn first(&self) -> Option<Vec3> {
        self.points.first().map(|p| p.position)
    }

    pub fn last(&self) -> Option<Vec3> {
        self.points.last().map(|p| p.position)
    }
}

/// Everything a plan reads from the world.
pub struct StrokeContext<'a> {
    pub scene: &'a Scene,
    pub spatial: &'a dyn SpatialQuery,
    pub terrain: Option<&'a dyn TerrainProvider>,
    pub category: StrokeCategory,
    /// Distance between samples (the connector's scale)
    pub spacing: f32,
    /// Smallest footprint of the connector
    pub min_scale: f32,
    /// Height above the sample the side probes start at
    pub probe_height: f32,
    /// Steepest ground (degrees, rounded) a connector may sit on
    pub max_slope: f32,
}

/// Drag vector reduced to its dominant horizontal axis.
pub fn stroke_direction(start: Vec3, end: Vec3) -> Vec3 {
    let delta = end - start;
    if delta.x.abs() >= delta.z.abs() {
        Vec3::new(delta.x, 0.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, delta.z)
    }
}

/// Evenly spaced samples from `start` towards `end`, dropped onto the
/// terrain when one is given. Always yields at least the start sample.
pub fn sample_path(start: Vec3, end: Vec3, spacing: f32, terrain: Option<&dyn TerrainProvider>) -> Vec<PathSample> {
    let span = stroke_direction(start, end);
    let distance = span.length();
    let direction = span.normalize_or_zero();
    let steps = if spacing > 0.0 {
        (distance / spacing).round() as usize + 1
    } else {
        1
    };

    (0..steps)
        .map(|i| {
            let mut position = start + direction * (spacing * i as f32);
            let mut slope = 0.0;
            if let Some(sample) = terrain.and_then(|t| t.sample(position.x, position.z)) {
                position.y = sample.height;
                slope = Vec3::Y.angle_between(sample.normal).to_degrees();
            }
            PathSample { position, slope }
        })
        .collect()
}

impl StrokeContext<'_> {
    fn probe(&self, at: Vec3, direction: ConnectionDirection) -> bool {
        let origin = at + Vec3::Y * self.probe_height;
        check_for_connection(self.scene, self.spatial, origin, self.spacing, self.category, direction, None).is_some()
    }

    fn region(&self, at: Vec3) -> AxisBounds {
        AxisBounds::new(Vec3::ZERO, Vec3::splat(self.min_scale), Frame::from_position(at))
    }

    /// Entities under a sample that are not connectors.
    fn blocked(&self, at: Vec3) -> bool {
        self.spatial
            .overlap_box(self.scene, &self.region(at), LayerMask::ALL)
            .iter()
            .filter_map(|id| self.scene.get(*id))
            .any(|e| matches!(e.kind, EntityKind::Core | EntityKind::Structure))
    }

    fn placeable(&self, sample: &PathSample) -> bool {
        sample.slope.round() <= self.max_slope && !self.blocked(sample.position)
    }

    fn overlapping(&self, at: Vec3) -> Vec<EntityId> {
        self.spatial
            .overlap_box(self.scene, &self.region(at), LayerMask::ALL)
            .into_iter()
            .filter(|id| {
                self.scene
                    .get(*id)
                    .and_then(|e| e.stroke.as_ref())
                    .is_some_and(|s| s.category == self.category)
            })
            .collect()
    }
}

/// Resolve every sample of a drag from `start` to `end`.
pub fn plan_stroke(ctx: &StrokeContext<'_>, start: Vec3, end: Vec3) -> StrokePlan {
    let samples = sample_path(start, end, ctx.spacing, ctx.terrain);
    let n = samples.len();

    let heading = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (last.position - first.position) * Vec3::new(1.0, 0.0, 1.0),
        _ => Vec3::ZERO,
    };
    let rotation = if heading.length_squared() > f32::EPSILON {
        look_rotation(heading.normalize(), Vec3::Y)
    } else {
        Quat::IDENTITY
    };
    let world = |local: ConnectionDirection| local.rotated(rotation);

    let mut flags = vec![false; 3 * n + 2];
    for (i, sample) in samples.iter().enumerate() {
        let p = 2 + 3 * i;
        flags[p] = ctx.placeable(sample);
        flags[p + 1] = ctx.probe(sample.position, world(ConnectionDirection::Left));
        flags[p - 1] = ctx.probe(sample.position, world(ConnectionDirection::Right));
    }
    if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
        flags[0] = ctx.probe(first.position, world(ConnectionDirection::Back));
        flags[3 * n + 1] = ctx.probe(last.position, world(ConnectionDirection::Front));
    }

    let clamp = |index: isize| index.clamp(0, flags.len() as isize - 1) as usize;
    let points = samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let p = 2 + 3 * i;
            let mut local = Vec::with_capacity(4);
            if flags[p + 1] {
                local.push(ConnectionDirection::Left);
            }
            if flags[p - 1] {
                local.push(ConnectionDirection::Right);
            }
            if flags[clamp(p as isize + 3)] {
                local.push(ConnectionDirection::Front);
            }
            if flags[clamp(p as isize - 3)] {
                local.push(ConnectionDirection::Back);
            }
            let connections = to_world(&local, rotation);

            let resolved = classify(&connections).and_then(|archetype| {
                ctx.scene
                    .catalog()
                    .archetype(ctx.category, archetype)
                    .and_then(|piece| piece.stroke.as_ref())
                    .map(|stroke| (archetype, match_angle(&connections, &stroke.directions)))
            });
            if resolved.is_none() {
                debug!(
                    "[Stroke] No {:?} connector for {:?} at {}",
                    ctx.category, connections, sample.position
                );
            }

            StrokePoint {
                position: sample.position,
                placeable: flags[p],
                connections,
                archetype: resolved.map(|(a, _)| a),
                yaw: resolved.map(|(_, yaw)| yaw).unwrap_or(0),
                overlapping: ctx.overlapping(sample.position),
            }
        })
        .collect();

    StrokePlan {
        category: ctx.category,
        rotation,
        points,
    }
}
