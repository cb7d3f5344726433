//! Transform Frames
//!
//! Position/rotation/scale triples and the conversions between a frame's
//! local space and the space it lives in. Axis conventions match the rest
//! of the engine: +Z is forward, +X is right, +Y is up.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Below this magnitude a scale component is treated as collapsed.
const SCALE_EPSILON: f32 = 1e-6;

/// A rigid transform with per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Frame {
    pub const IDENTITY: Frame = Frame {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Unrotated, unscaled frame at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Frame rotated by `rotation` around the origin.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Map a point from this frame's local space into the parent space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }

    /// Map a parent-space point into this frame's local space.
    ///
    /// Collapsed scale axes map to zero instead of dividing by zero.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        let unrotated = self.rotation.inverse() * (point - self.position);
        Vec3::new(
            safe_div(unrotated.x, self.scale.x),
            safe_div(unrotated.y, self.scale.y),
            safe_div(unrotated.z, self.scale.z),
        )
    }

    /// Map a local direction into the parent space (scale applied, no translation).
    pub fn transform_vector(&self, local: Vec3) -> Vec3 {
        self.rotation * (local * self.scale)
    }

    /// Compose `child` (expressed in this frame) into the parent space.
    pub fn compose(&self, child: &Frame) -> Frame {
        Frame {
            position: self.transform_point(child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Express `world` relative to this frame. Inverse of [`Frame::compose`].
    pub fn relative(&self, world: &Frame) -> Frame {
        Frame {
            position: self.inverse_transform_point(world.position),
            rotation: self.rotation.inverse() * world.rotation,
            scale: Vec3::new(
                safe_div(world.scale.x, self.scale.x),
                safe_div(world.scale.y, self.scale.y),
                safe_div(world.scale.z, self.scale.z),
            ),
        }
    }

    /// Yaw of the frame in degrees, measured from +Z towards +X.
    pub fn yaw_degrees(&self) -> f32 {
        yaw_degrees(self.rotation)
    }
}

/// Yaw of a rotation in degrees, measured from +Z towards +X.
pub fn yaw_degrees(rotation: Quat) -> f32 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    yaw.to_degrees()
}

/// Rotation that keeps only the yaw component of `rotation`.
pub fn flatten_to_yaw(rotation: Quat) -> Quat {
    let forward = rotation * Vec3::Z;
    let flat = Vec3::new(forward.x, 0.0, forward.z);
    if flat.length_squared() < SCALE_EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(flat.x.atan2(flat.z))
}

/// Rotation whose forward axis points along `forward`, keeping `up` as close
/// to world up as possible.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let f = forward.normalize_or_zero();
    if f == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut r = up.cross(f);
    if r.length_squared() < SCALE_EPSILON {
        // forward is parallel to up, pick any perpendicular right axis
        r = Vec3::X.cross(f);
        if r.length_squared() < SCALE_EPSILON {
            r = Vec3::Z.cross(f);
        }
    }
    let r = r.normalize();
    let u = f.cross(r);
    Quat::from_mat3(&glam::Mat3::from_cols(r, u, f))
}

fn safe_div(value: f32, divisor: f32) -> f32 {
    if divisor.abs() < SCALE_EPSILON {
        0.0
    } else {
        value / divisor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_transform_round_trip() {
        let frame = Frame::new(
            Vec3::new(3.0, 1.0, -2.0),
            Quat::from_rotation_y(35f32.to_radians()),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let local = Vec3::new(0.25, 4.0, -1.5);
        let world = frame.transform_point(local);
        assert!(approx(frame.inverse_transform_point(world), local));
    }

    #[test]
    fn test_compose_then_relative() {
        let parent = Frame::new(Vec3::new(10.0, 0.0, 0.0), Quat::from_rotation_y(1.0), Vec3::ONE);
        let child = Frame::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.5), Vec3::splat(2.0));
        let world = parent.compose(&child);
        let back = parent.relative(&world);
        assert!(approx(back.position, child.position));
        assert!(back.rotation.dot(child.rotation).abs() > 1.0 - 1e-6);
        assert!(approx(back.scale, child.scale));
    }

    #[test]
    fn test_collapsed_scale_does_not_divide_by_zero() {
        let frame = Frame::new(Vec3::ZERO, Quat::IDENTITY, Vec3::new(0.0, 1.0, 1.0));
        let local = frame.inverse_transform_point(Vec3::new(5.0, 1.0, 1.0));
        assert_eq!(local.x, 0.0);
    }

    #[test]
    fn test_yaw_and_flatten() {
        let rotation = Quat::from_rotation_y(90f32.to_radians()) * Quat::from_rotation_x(0.3);
        assert!((yaw_degrees(flatten_to_yaw(rotation)) - 90.0).abs() < 1e-3);
        assert!(approx(flatten_to_yaw(rotation) * Vec3::Z, Vec3::X));
    }

    #[test]
    fn test_look_rotation_axes() {
        let rotation = look_rotation(Vec3::X, Vec3::Y);
        assert!(approx(rotation * Vec3::Z, Vec3::X));
        assert!(approx(rotation * Vec3::Y, Vec3::Y));

        // Looking straight up still yields a valid rotation
        let up = look_rotation(Vec3::Y, Vec3::Y);
        assert!(approx(up * Vec3::Z, Vec3::Y));
    }
}
