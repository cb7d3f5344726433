//! World Module
//!
//! World-space geometry shared by every placeable: transform frames, grid
//! rounding and local-frame box bounds.
//!
//! ## Units
//! 1 unit = 1 meter. +Y is up, +Z is forward, +X is right.

pub mod bounds;
pub mod frame;
pub mod grid;

pub use bounds::AxisBounds;
pub use frame::{Frame, flatten_to_yaw, look_rotation, yaw_degrees};
pub use grid::{GridFrame, round_to_grid_local, snap_to_grid};
