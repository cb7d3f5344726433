//! Grid Rounding Module
//!
//! Rounds world positions onto a horizontal grid. The grid can be anchored
//! at any origin and turned to any yaw, so the same routines serve both the
//! world grid and the local grid of a rotated building set.
//!
//! ## Conventions
//! - Only X and Z are rounded; Y always passes through untouched.
//! - A cell size of zero or less disables rounding.
//! - Offsets are world vectors. They are expressed in the grid's own axes
//!   before rounding, so an offset of half a cell along the grid forward
//!   lands results on cell edges rather than intersections.

use glam::{Quat, Vec3};

use super::frame::flatten_to_yaw;

/// A horizontal grid: origin, yaw and cell size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridFrame {
    /// World-space point that sits on a grid intersection
    pub origin: Vec3,
    /// Grid orientation. Only the yaw component is used.
    pub rotation: Quat,
    /// Cell size (meters)
    pub cell: f32,
}

impl Default for GridFrame {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            cell: 1.0,
        }
    }
}

impl GridFrame {
    pub fn new(origin: Vec3, rotation: Quat, cell: f32) -> Self {
        Self {
            origin,
            rotation: flatten_to_yaw(rotation),
            cell,
        }
    }

    /// World-aligned grid through the origin.
    pub fn world(cell: f32) -> Self {
        Self {
            cell,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Round onto grid intersections.
    pub fn snap(&self, pos: Vec3) -> Vec3 {
        self.snap_with_offset(pos, Vec3::ZERO)
    }

    /// Round onto the grid shifted by a world-space `offset`.
    pub fn snap_with_offset(&self, pos: Vec3, offset: Vec3) -> Vec3 {
        round_to_grid_local(self.cell, pos, self.rotation, self.origin, offset)
    }

    /// Round onto cell centers (half a cell along forward and right).
    pub fn snap_to_center(&self, pos: Vec3) -> Vec3 {
        let half = self.cell * 0.5;
        self.snap_with_offset(pos, (self.forward() + self.right()) * half)
    }
}

/// Standalone function to snap a position to a world-aligned grid.
///
/// Useful when you don't have a GridFrame but need basic snapping.
pub fn snap_to_grid(pos: Vec3, grid_size: f32) -> Vec3 {
    if grid_size <= 0.0 {
        return pos;
    }
    Vec3::new(
        (pos.x / grid_size).round() * grid_size,
        pos.y,
        (pos.z / grid_size).round() * grid_size,
    )
}

/// Round the X/Z components of `pos` to multiples of `step` measured in a
/// grid that is anchored at `grid_center` and turned by `rotation`.
///
/// `offset` is a world vector added to the grid lattice before rounding.
pub fn round_to_grid_local(
    step: f32,
    pos: Vec3,
    rotation: Quat,
    grid_center: Vec3,
    offset: Vec3,
) -> Vec3 {
    if step <= 0.0 {
        return pos;
    }
    let yaw = flatten_to_yaw(rotation);
    let inverse = yaw.inverse();
    let local = inverse * (pos - grid_center);
    let local_offset = inverse * offset;

    let x = ((local.x - local_offset.x) / step).round() * step + local_offset.x;
    let z = ((local.z - local_offset.z) / step).round() * step + local_offset.z;

    let snapped = grid_center + yaw * Vec3::new(x, local.y, z);
    Vec3::new(snapped.x, pos.y, snapped.z)
}
