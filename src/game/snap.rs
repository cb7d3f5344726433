//! Snap Calculator
//!
//! Pure functions mapping a raw target position onto the grid under one of
//! the snap policies. The grid is described by a [`SnapFrame`]: cell size,
//! grid-center origin and an optional reference orientation (a set's frame
//! when snapping in local space, world axes otherwise).
//!
//! | Policy   | Result                                                   |
//! |----------|----------------------------------------------------------|
//! | FreeForm | the raw target                                           |
//! | Cross    | nearest grid intersection                                |
//! | Center   | nearest cell center                                      |
//! | Edge     | nearest cell edge, pushed half a footprint off the line  |

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::world::round_to_grid_local;

use super::restriction::PositionRestriction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapPolicy {
    /// Resolve to the entity's own snap type
    #[default]
    Default,
    FreeForm,
    Cross,
    Center,
    Edge,
}

impl SnapPolicy {
    /// Replace `Default` with the entity's own policy.
    pub fn resolve(self, own: SnapPolicy) -> SnapPolicy {
        match self {
            SnapPolicy::Default => own,
            other => other,
        }
    }

    /// Grid-locked entities always land on cell centers.
    pub fn restricted(self, position: PositionRestriction) -> SnapPolicy {
        match position {
            PositionRestriction::GridOnly => SnapPolicy::Center,
            PositionRestriction::None => self,
        }
    }
}

/// Grid and entity context for one snap call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapFrame {
    /// Cell size (the entity's restricted scale)
    pub cell: f32,
    /// World-space grid origin
    pub grid_center: Vec3,
    /// Reference orientation; `None` means world axes
    pub orientation: Option<Quat>,
    /// The entity's current world forward
    pub entity_forward: Vec3,
    /// The entity's smallest horizontal footprint
    pub min_scale: f32,
}

impl SnapFrame {
    /// World-aligned grid through the origin.
    pub fn world(cell: f32) -> Self {
        Self {
            cell,
            grid_center: Vec3::ZERO,
            orientation: None,
            entity_forward: Vec3::Z,
            min_scale: cell,
        }
    }

    fn rotation(&self) -> Quat {
        self.orientation.unwrap_or(Quat::IDENTITY)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    fn round(&self, pos: Vec3, offset: Vec3) -> Vec3 {
        round_to_grid_local(self.cell, pos, self.rotation(), self.grid_center, offset)
    }

    /// Half a cell along whichever reference axis is perpendicular to the
    /// entity's forward.
    pub fn edge_offset(&self) -> Vec3 {
        let forward = self.forward();
        let along = if self.entity_forward.dot(forward).round() == 0.0 {
            forward
        } else {
            self.right()
        };
        along * (self.cell * 0.5)
    }
}

/// Snap `target` under `policy`. `Default` is treated as FreeForm; callers
/// resolve it against the entity first.
pub fn snap_position(target: Vec3, policy: SnapPolicy, frame: &SnapFrame) -> Vec3 {
    match policy {
        SnapPolicy::Default | SnapPolicy::FreeForm => target,
        SnapPolicy::Cross => frame.round(target, Vec3::ZERO),
        SnapPolicy::Center => {
            let offset = (frame.forward() + frame.right()) * (frame.cell * 0.5);
            frame.round(target, offset)
        }
        SnapPolicy::Edge => {
            let grid = frame.round(target, frame.edge_offset());
            let forward = frame.entity_forward;
            let side = if forward.dot(target - grid) <= 0.0 { -1.0 } else { 1.0 };
            grid + forward * (side * frame.min_scale * 0.5)
        }
    }
}

/// New "last grid position" memo after a placement.
///
/// `own` is the entity's configured snap type, `target` the policy actually
/// used. The memo must stay on the same lattice while a drag switches
/// between policies, so Edge placements store the unshifted line position.
pub fn grid_memo(own: SnapPolicy, target: SnapPolicy, placed: Vec3, raw: Vec3, frame: &SnapFrame) -> Vec3 {
    use SnapPolicy::*;
    match (own, target) {
        (Edge | Center, Edge) => frame.round(raw, Vec3::ZERO),
        (Edge, FreeForm) | (FreeForm, Edge) => {
            placed - (frame.edge_offset() + frame.forward() * (frame.min_scale * 0.5))
        }
        (_, Center) => frame.round(raw, Vec3::ZERO),
        _ => placed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_free_form_is_identity() {
        let target = Vec3::new(1.23, 4.5, -6.7);
        assert_eq!(snap_position(target, SnapPolicy::FreeForm, &SnapFrame::world(1.0)), target);
    }

    #[test]
    fn test_cross_rounds_xz_only() {
        let snapped = snap_position(Vec3::new(1.4, 2.3, -0.6), SnapPolicy::Cross, &SnapFrame::world(1.0));
        assert!(approx(snapped, Vec3::new(1.0, 2.3, -1.0)));
    }

    #[test]
    fn test_cross_relative_to_grid_center() {
        let frame = SnapFrame {
            grid_center: Vec3::new(0.25, 0.0, 0.25),
            ..SnapFrame::world(1.0)
        };
        let snapped = snap_position(Vec3::new(1.4, 0.0, 1.1), SnapPolicy::Cross, &frame);
        assert!(approx(snapped, Vec3::new(1.25, 0.0, 1.25)));
    }

    #[test]
    fn test_center_lands_on_cell_centers() {
        let snapped = snap_position(Vec3::new(0.9, 0.0, 0.1), SnapPolicy::Center, &SnapFrame::world(2.0));
        assert!(approx(snapped, Vec3::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_center_follows_orientation() {
        let frame = SnapFrame {
            orientation: Some(Quat::from_rotation_y(45f32.to_radians())),
            ..SnapFrame::world(1.0)
        };
        let snapped = snap_position(Vec3::new(0.1, 0.0, 0.6), SnapPolicy::Center, &frame);
        // Cell centers of a 45° grid sit on the +Z axis at odd multiples of sqrt(0.5)
        assert!(approx(snapped, Vec3::new(0.0, 0.0, 0.5f32.sqrt())));
    }

    #[test]
    fn test_edge_picks_side_of_pointer() {
        let frame = SnapFrame {
            min_scale: 0.5,
            ..SnapFrame::world(2.0)
        };
        // Entity faces +Z: edge lines run along X at even Z, shifted one unit on X
        let front = snap_position(Vec3::new(1.2, 0.0, 0.3), SnapPolicy::Edge, &frame);
        assert!(approx(front, Vec3::new(1.0, 0.0, 0.25)));
        let back = snap_position(Vec3::new(1.2, 0.0, -0.3), SnapPolicy::Edge, &frame);
        assert!(approx(back, Vec3::new(1.0, 0.0, -0.25)));
    }

    #[test]
    fn test_grid_only_forces_center() {
        assert_eq!(SnapPolicy::Edge.restricted(PositionRestriction::GridOnly), SnapPolicy::Center);
        assert_eq!(SnapPolicy::Edge.restricted(PositionRestriction::None), SnapPolicy::Edge);
        assert_eq!(SnapPolicy::Default.resolve(SnapPolicy::Cross), SnapPolicy::Cross);
    }

    #[test]
    fn test_memo_cases() {
        let frame = SnapFrame::world(1.0);
        let raw = Vec3::new(0.4, 0.0, 0.6);
        let placed = Vec3::new(9.0, 0.0, 9.0);
        // Edge to Edge and anything to Center keep the unshifted intersection
        assert!(approx(grid_memo(SnapPolicy::Edge, SnapPolicy::Edge, placed, raw, &frame), Vec3::new(0.0, 0.0, 1.0)));
        assert!(approx(grid_memo(SnapPolicy::FreeForm, SnapPolicy::Center, placed, raw, &frame), Vec3::new(0.0, 0.0, 1.0)));
        // FreeForm to FreeForm passes the placed position through
        assert_eq!(grid_memo(SnapPolicy::FreeForm, SnapPolicy::FreeForm, placed, raw, &frame), placed);
        // Edge/FreeForm switches remove the edge shift
        let memo = grid_memo(SnapPolicy::Edge, SnapPolicy::FreeForm, placed, raw, &frame);
        assert!(approx(memo, placed - (Vec3::new(0.5, 0.0, 0.0) + Vec3::new(0.0, 0.0, 0.5))));
    }
}
