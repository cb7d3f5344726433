//! Axis Bounds
//!
//! Box extents that live in the local space of an owning frame. The box is
//! axis-aligned in that local space, so a rotated owner yields an oriented
//! box in world space. Merging and overlap tests between two bounds project
//! the other box into this box's frame first, which keeps rotated owners
//! comparable.
//!
//! A bounds with zero center and zero size has never been given a footprint
//! and is "uninitialized": it never overlaps anything and merging into it
//! adopts the other footprint.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::frame::Frame;

/// Overlap must exceed this depth on every axis to count.
const OVERLAP_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    /// Center in the owner's local space
    pub center: Vec3,
    /// Full size in the owner's local space
    pub size: Vec3,
    /// Owner transform the bounds are measured against
    pub frame: Frame,
}

impl Default for AxisBounds {
    fn default() -> Self {
        Self::uninitialized(Frame::IDENTITY)
    }
}

impl AxisBounds {
    pub fn new(center: Vec3, size: Vec3, frame: Frame) -> Self {
        Self {
            center,
            size: size.abs(),
            frame,
        }
    }

    /// Bounds with no footprint yet.
    pub fn uninitialized(frame: Frame) -> Self {
        Self {
            center: Vec3::ZERO,
            size: Vec3::ZERO,
            frame,
        }
    }

    pub fn is_uninitialized(&self) -> bool {
        self.center == Vec3::ZERO && self.size == Vec3::ZERO
    }

    /// Same footprint measured against another owner transform.
    pub fn with_frame(&self, frame: Frame) -> Self {
        Self { frame, ..*self }
    }

    /// Half size in local units.
    pub fn extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Local minimum corner.
    pub fn min(&self) -> Vec3 {
        self.center - self.extents()
    }

    /// Local maximum corner.
    pub fn max(&self) -> Vec3 {
        self.center + self.extents()
    }

    pub fn world_center(&self) -> Vec3 {
        self.frame.transform_point(self.center)
    }

    /// Half size along the owner's axes, with the owner scale applied.
    pub fn world_extents(&self) -> Vec3 {
        (self.extents() * self.frame.scale).abs()
    }

    /// Center expressed in the owner's parent space, without rotation applied.
    ///
    /// This is the point the owner pivot would need to move to for the
    /// bounds center to coincide with it.
    pub fn local_center(&self) -> Vec3 {
        self.frame.position + self.frame.rotation * (self.center * self.frame.scale)
    }

    /// Size along the owner axes with the owner scale applied.
    pub fn scaled_size(&self) -> Vec3 {
        (self.size * self.frame.scale).abs()
    }

    /// Largest horizontal extent.
    pub fn scale(&self) -> f32 {
        let size = self.scaled_size();
        size.x.max(size.z)
    }

    /// Smallest horizontal extent.
    pub fn min_scale(&self) -> f32 {
        let size = self.scaled_size();
        size.x.min(size.z)
    }

    /// Largest extent on any axis.
    pub fn max_extend(&self) -> f32 {
        self.scaled_size().max_element()
    }

    /// The eight corners in world space.
    pub fn corners(&self) -> [Vec3; 8] {
        let min = self.min();
        let max = self.max();
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            );
            *corner = self.frame.transform_point(local);
        }
        corners
    }

    /// World-space axis-aligned box enclosing the bounds.
    pub fn world_aabb(&self) -> (Vec3, Vec3) {
        let corners = self.corners();
        corners.iter().skip(1).fold((corners[0], corners[0]), |(min, max), c| {
            (min.min(*c), max.max(*c))
        })
    }

    /// Highest world point of the bounds.
    pub fn top(&self) -> f32 {
        self.world_aabb().1.y
    }

    /// Lowest world point of the bounds.
    pub fn bottom(&self) -> f32 {
        self.world_aabb().0.y
    }

    /// Local-space min/max of `other` once projected into this frame.
    pub fn project(&self, other: &AxisBounds) -> (Vec3, Vec3) {
        let corners = other.corners();
        let first = self.frame.inverse_transform_point(corners[0]);
        corners.iter().skip(1).fold((first, first), |(min, max), c| {
            let local = self.frame.inverse_transform_point(*c);
            (min.min(local), max.max(local))
        })
    }

    /// Grow this bounds (in its own local frame) to contain `other`.
    ///
    /// Uninitialized bounds on either side are ignored, so folding a list of
    /// bounds into an uninitialized starting value is order independent.
    pub fn encapsulate(&mut self, other: &AxisBounds) {
        if other.is_uninitialized() {
            return;
        }
        let (other_min, other_max) = self.project(other);
        let (min, max) = if self.is_uninitialized() {
            (other_min, other_max)
        } else {
            (self.min().min(other_min), self.max().max(other_max))
        };
        self.center = (min + max) * 0.5;
        self.size = max - min;
    }

    /// Returns the merged bounds without mutating `self`.
    pub fn encapsulated(mut self, other: &AxisBounds) -> Self {
        self.encapsulate(other);
        self
    }

    /// Strict overlap test in this bounds' local space.
    ///
    /// Touching faces do not count, and uninitialized bounds never overlap.
    pub fn intersects(&self, other: &AxisBounds) -> bool {
        if self.is_uninitialized() || other.is_uninitialized() {
            return false;
        }
        let (other_min, other_max) = self.project(other);
        let min = self.min();
        let max = self.max();
        (0..3).all(|axis| {
            min[axis] < other_max[axis] - OVERLAP_EPSILON
                && other_min[axis] < max[axis] - OVERLAP_EPSILON
        })
    }

    /// Whether a world-space point lies inside the bounds.
    pub fn contains_point(&self, point: Vec3) -> bool {
        if self.is_uninitialized() {
            return false;
        }
        let local = self.frame.inverse_transform_point(point);
        let min = self.min();
        let max = self.max();
        (0..3).all(|axis| local[axis] >= min[axis] && local[axis] <= max[axis])
    }
}
