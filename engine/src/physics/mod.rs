//! Physics module
//!
//! Minimal geometric queries used by the placement engine's reference
//! spatial query: ray/box slabs and box overlap. Built from scratch without
//! an external physics library.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! # Submodules
//!
//! - [`collision`] - Ray-box intersection for world-aligned and frame-owned boxes

pub mod collision;

pub use collision::{BoxHit, aabb_overlap, aabb_surface_normal, ray_aabb_intersect, ray_bounds_intersect};
