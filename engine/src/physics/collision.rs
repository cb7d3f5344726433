//! Collision detection module
//!
//! Ray and box tests used by the in-memory spatial query. Boxes are either
//! world-aligned (`ray_aabb_intersect`) or [`AxisBounds`] owned by a rotated,
//! scaled frame (`ray_bounds_intersect`), in which case the ray is carried
//! into the owner's local space and tested with the same slab method.
//!
//! # Example
//!
//! ```ignore
//! use modular_builder_engine::physics::collision::ray_aabb_intersect;
//! use glam::Vec3;
//!
//! let origin = Vec3::new(0.0, 0.0, -5.0);
//! let direction = Vec3::new(0.0, 0.0, 1.0);
//! if let Some(t) = ray_aabb_intersect(origin, direction, Vec3::splat(-1.0), Vec3::splat(1.0)) {
//!     let hit_point = origin + direction * t;
//! }
//! ```

use glam::Vec3;

use crate::world::AxisBounds;

/// Where a ray met a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxHit {
    /// World-space position where the collision occurred
    pub position: Vec3,
    /// Surface normal at the hit point (normalized)
    pub normal: Vec3,
    /// Distance from ray origin to hit point
    pub distance: f32,
}

impl BoxHit {
    pub fn new(position: Vec3, normal: Vec3, distance: f32) -> Self {
        Self {
            position,
            normal,
            distance,
        }
    }
}

/// Performs ray-AABB (Axis-Aligned Bounding Box) intersection test using the slab method.
///
/// The slab method works by finding the intersection of the ray with each pair of
/// axis-aligned planes that make up the AABB. If the ray enters and exits the AABB
/// at valid times (t_enter < t_exit and t_exit > 0), there is an intersection.
///
/// # Returns
///
/// * `Some(t)` - Ray parameter of the nearest intersection (t >= 0)
/// * `None` - No intersection or intersection is behind the ray origin
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    // Near-zero direction components get a huge inverse so their slab never limits t
    let inv_dir = Vec3::new(
        if ray_dir.x.abs() > 1e-10 { 1.0 / ray_dir.x } else { f32::MAX * ray_dir.x.signum() },
        if ray_dir.y.abs() > 1e-10 { 1.0 / ray_dir.y } else { f32::MAX * ray_dir.y.signum() },
        if ray_dir.z.abs() > 1e-10 { 1.0 / ray_dir.z } else { f32::MAX * ray_dir.z.signum() },
    );

    let t1 = (aabb_min.x - ray_origin.x) * inv_dir.x;
    let t2 = (aabb_max.x - ray_origin.x) * inv_dir.x;

    let mut t_min = t1.min(t2);
    let mut t_max = t1.max(t2);

    let t3 = (aabb_min.y - ray_origin.y) * inv_dir.y;
    let t4 = (aabb_max.y - ray_origin.y) * inv_dir.y;

    t_min = t_min.max(t3.min(t4));
    t_max = t_max.min(t3.max(t4));

    let t5 = (aabb_min.z - ray_origin.z) * inv_dir.z;
    let t6 = (aabb_max.z - ray_origin.z) * inv_dir.z;

    t_min = t_min.max(t5.min(t6));
    t_max = t_max.min(t5.max(t6));

    if t_max >= t_min && t_max >= 0.0 {
        if t_min >= 0.0 {
            Some(t_min)
        } else {
            // Ray starts inside the AABB
            Some(t_max)
        }
    } else {
        None
    }
}

/// Computes the outward normal of the AABB face closest to `point`.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = ((aabb_max - aabb_min) * 0.5).max(Vec3::splat(1e-6));
    let local = point - center;

    let normalized = local / half_extents;
    let abs_normalized = normalized.abs();

    if abs_normalized.x >= abs_normalized.y && abs_normalized.x >= abs_normalized.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs_normalized.y >= abs_normalized.x && abs_normalized.y >= abs_normalized.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}

/// Ray test against bounds owned by an arbitrary frame.
///
/// `ray_dir` must be normalized; the returned distance is in world units.
/// Uninitialized bounds are never hit.
pub fn ray_bounds_intersect(ray_origin: Vec3, ray_dir: Vec3, bounds: &AxisBounds) -> Option<BoxHit> {
    if bounds.is_uninitialized() {
        return None;
    }
    let frame = &bounds.frame;
    let local_origin = frame.inverse_transform_point(ray_origin);
    let local_dir = frame.inverse_transform_point(frame.position + ray_dir);

    // The frame map is affine, so the ray parameter is shared by both spaces
    let t = ray_aabb_intersect(local_origin, local_dir, bounds.min(), bounds.max())?;
    let local_hit = local_origin + local_dir * t;
    let local_normal = aabb_surface_normal(local_hit, bounds.min(), bounds.max());
    let normal = (frame.rotation * local_normal).normalize_or_zero();

    Some(BoxHit::new(ray_origin + ray_dir * t, normal, t))
}

/// Strict overlap of two world-aligned boxes.
pub fn aabb_overlap(a_min: Vec3, a_max: Vec3, b_min: Vec3, b_max: Vec3) -> bool {
    a_min.x < b_max.x && b_min.x < a_max.x
        && a_min.y < b_max.y && b_min.y < a_max.y
        && a_min.z < b_max.z && b_min.z < a_max.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Frame;
    use glam::Quat;

    #[test]
    fn test_ray_hits_aabb_from_front() {
        let origin = Vec3::new(0.0, 0.0, -5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);

        let t = ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::splat(1.0))
            .expect("ray should hit");
        assert!((t - 4.0).abs() < 0.001, "Expected t=4.0, got t={}", t);
    }

    #[test]
    fn test_ray_misses_aabb() {
        let origin = Vec3::new(0.0, 5.0, -5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);

        let result = ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_starts_inside_aabb() {
        let dir = Vec3::new(0.0, 0.0, 1.0);

        let t = ray_aabb_intersect(Vec3::ZERO, dir, Vec3::splat(-1.0), Vec3::splat(1.0))
            .expect("ray should hit");
        // Should hit the exit face at z=1
        assert!((t - 1.0).abs() < 0.001, "Expected t=1.0, got t={}", t);
    }

    #[test]
    fn test_ray_aabb_behind_origin() {
        let origin = Vec3::new(0.0, 0.0, 5.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);

        let result = ray_aabb_intersect(origin, dir, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_surface_normal_x_face() {
        let normal = aabb_surface_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(normal, Vec3::X);
    }

    #[test]
    fn test_ray_hits_rotated_bounds() {
        // 4m long box turned a quarter: it now spans Z from -2 to 2
        let bounds = AxisBounds::new(
            Vec3::ZERO,
            Vec3::new(4.0, 1.0, 1.0),
            Frame::new(Vec3::new(0.0, 0.0, 0.0), Quat::from_rotation_y(90f32.to_radians()), Vec3::ONE),
        );
        let hit = ray_bounds_intersect(Vec3::new(0.0, 0.0, -10.0), Vec3::Z, &bounds)
            .expect("ray should hit rotated box");
        assert!((hit.distance - 8.0).abs() < 1e-3);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-3);
    }

    #[test]
    fn test_ray_respects_frame_scale() {
        let bounds = AxisBounds::new(
            Vec3::ZERO,
            Vec3::ONE,
            Frame::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY, Vec3::splat(2.0)),
        );
        let hit = ray_bounds_intersect(Vec3::ZERO, Vec3::Z, &bounds).expect("ray should hit");
        assert!((hit.distance - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_uninitialized_bounds_never_hit() {
        let bounds = AxisBounds::default();
        assert!(ray_bounds_intersect(Vec3::new(0.0, 0.0, -1.0), Vec3::Z, &bounds).is_none());
    }

    #[test]
    fn test_aabb_overlap() {
        assert!(aabb_overlap(Vec3::ZERO, Vec3::ONE, Vec3::splat(0.5), Vec3::splat(2.0)));
        assert!(!aabb_overlap(Vec3::ZERO, Vec3::ONE, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0)));
    }
}
