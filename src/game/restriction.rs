//! Restriction Sets
//!
//! Per-entity movement, rotation, space and scale constraints. Every axis
//! has a total order from least to most restrictive, and grouping entities
//! can only ever move an axis up that order: a set is as restricted as its
//! most restricted member.
//!
//! ```ignore
//! let group = RestrictionSet::aggregate(members.iter());
//! assert!(group.position >= PositionRestriction::None);
//! ```

use glam::{EulerRot, Quat};
use serde::{Deserialize, Serialize};

/// Free movement vs. grid-locked movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionRestriction {
    #[default]
    None,
    GridOnly,
}

/// Rotation about every axis vs. yaw only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RotationRestriction {
    #[default]
    Xyz,
    YOnly,
}

/// Whether the entity may follow a local (set) frame or only world axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpaceRestriction {
    #[default]
    None,
    WorldOnly,
}

/// Aggregated constraints of an entity or a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestrictionSet {
    pub position: PositionRestriction,
    /// Grid cell (meters) enforced while grid-locked; 0 when free
    pub position_grid: f32,
    pub rotation: RotationRestriction,
    /// Minimum rotation snap in degrees, 0 = free
    pub rotation_step: f32,
    pub space: SpaceRestriction,
    pub scalable: bool,
}

impl Default for RestrictionSet {
    fn default() -> Self {
        Self::UNRESTRICTED
    }
}

impl RestrictionSet {
    /// The least restrictive value on every axis.
    pub const UNRESTRICTED: RestrictionSet = RestrictionSet {
        position: PositionRestriction::None,
        position_grid: 0.0,
        rotation: RotationRestriction::Xyz,
        rotation_step: 0.0,
        space: SpaceRestriction::None,
        scalable: true,
    };

    pub fn is_grid_locked(&self) -> bool {
        self.position == PositionRestriction::GridOnly
    }

    /// Fold `other` into `self`, keeping the more restrictive value per axis.
    ///
    /// The grid cell only grows from grid-locked contributors.
    pub fn tighten(&mut self, other: &RestrictionSet) {
        self.position = self.position.max(other.position);
        self.rotation = self.rotation.max(other.rotation);
        self.rotation_step = self.rotation_step.max(other.rotation_step);
        self.space = self.space.max(other.space);
        self.scalable &= other.scalable;
        if other.is_grid_locked() {
            self.position_grid = self.position_grid.max(other.position_grid);
        }
    }

    /// `self` tightened by `other`, leaving both untouched.
    pub fn tightened(mut self, other: &RestrictionSet) -> Self {
        self.tighten(other);
        self
    }

    /// Aggregate a group's members, starting from the unrestricted defaults.
    pub fn aggregate<'a>(members: impl IntoIterator<Item = &'a RestrictionSet>) -> Self {
        members.into_iter().fold(Self::UNRESTRICTED, |acc, member| acc.tightened(member))
    }

    /// Grid cell used for snapping: the enforced grid while locked, else `scale`.
    pub fn restricted_scale(&self, scale: f32) -> f32 {
        if self.is_grid_locked() && self.position_grid > 0.0 {
            self.position_grid
        } else {
            scale
        }
    }

    /// Round a rotation's euler angles to the step, dropping pitch and roll
    /// when only yaw is allowed.
    pub fn restrict_rotation(&self, rotation: Quat) -> Quat {
        let (mut yaw, mut pitch, mut roll) = rotation.to_euler(EulerRot::YXZ);
        if self.rotation == RotationRestriction::YOnly {
            pitch = 0.0;
            roll = 0.0;
        }
        if self.rotation_step > 0.0 {
            let step = self.rotation_step.to_radians();
            yaw = (yaw / step).round() * step;
            pitch = (pitch / step).round() * step;
            roll = (roll / step).round() * step;
        }
        Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll)
    }
}
