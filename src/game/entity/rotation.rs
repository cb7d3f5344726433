//! Split Rotation
//!
//! An entity's rotation is a canonical base (set by alignment or loading)
//! composed with a free offset (set by rotate input). The effective value
//! is computed on read and never stored.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::game::restriction::RestrictionSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRotation {
    pub base: Quat,
    pub offset: Quat,
}

impl Default for SplitRotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SplitRotation {
    pub const IDENTITY: SplitRotation = SplitRotation {
        base: Quat::IDENTITY,
        offset: Quat::IDENTITY,
    };

    pub fn new(base: Quat, offset: Quat) -> Self {
        Self { base, offset }
    }

    pub fn from_base(base: Quat) -> Self {
        Self {
            base,
            offset: Quat::IDENTITY,
        }
    }

    /// `base ∘ offset`, rounded to the restriction's rotation step.
    pub fn effective(&self, restrictions: &RestrictionSet) -> Quat {
        restrictions.restrict_rotation((self.base * self.offset).normalize())
    }

    /// Compose an extra yaw onto the offset.
    pub fn add_yaw(&mut self, degrees: f32) {
        self.offset = (self.offset * Quat::from_rotation_y(degrees.to_radians())).normalize();
    }
}

/// Euler angles in degrees (x = pitch, y = yaw, z = roll).
pub fn to_euler_degrees(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// Inverse of [`to_euler_degrees`].
pub fn from_euler_degrees(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler.y.to_radians(),
        euler.x.to_radians(),
        euler.z.to_radians(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::restriction::RotationRestriction;

    #[test]
    fn test_effective_composes_base_and_offset() {
        let mut rotation = SplitRotation::from_base(Quat::from_rotation_y(30f32.to_radians()));
        rotation.add_yaw(60.0);
        let effective = rotation.effective(&RestrictionSet::UNRESTRICTED);
        assert!(effective.dot(Quat::from_rotation_y(90f32.to_radians())).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn test_effective_respects_step() {
        let rotation = SplitRotation::new(Quat::IDENTITY, Quat::from_rotation_y(100f32.to_radians()));
        let stepped = RestrictionSet {
            rotation: RotationRestriction::YOnly,
            rotation_step: 90.0,
            ..RestrictionSet::UNRESTRICTED
        };
        let effective = rotation.effective(&stepped);
        assert!(effective.dot(Quat::from_rotation_y(90f32.to_radians())).abs() > 1.0 - 1e-6);
        // Base and offset themselves are untouched
        assert!(rotation.offset.dot(Quat::from_rotation_y(100f32.to_radians())).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn test_euler_degrees_roundtrip_yaw() {
        let euler = to_euler_degrees(from_euler_degrees(Vec3::new(0.0, 90.0, 0.0)));
        assert!((euler.y - 90.0).abs() < 1e-3);
    }
}
