//! Modular Builder Engine Library
//!
//! Placement and connection engine for grid-based modular building: pieces
//! snap, stack, rotate and group into sets, and connector pieces (paths,
//! fences) are drawn as strokes whose geometry follows their neighbours.
//!
//! # Modules
//!
//! - [`world`] - Frames, grid rounding and [`world::AxisBounds`]
//! - [`physics`] - Ray/box intersection used by the in-memory spatial query
//! - [`input`] - Pointer sample, key edges and key-to-action bindings
//! - [`game`] - Restrictions, snapping, sets, strokes and the placement session
//!
//! # Example
//!
//! ```ignore
//! use modular_builder_engine::game::{BuildingSystem, PieceCatalog, PlacementConfig};
//! use modular_builder_engine::game::collab::Collaborators;
//! use modular_builder_engine::input::{InputState, PointerSample};
//! use glam::Vec3;
//!
//! let mut system = BuildingSystem::new(
//!     PieceCatalog::new(),
//!     Collaborators::in_memory(1_000),
//!     PlacementConfig::default(),
//! );
//! system.place_piece_as_set("crate", Vec3::ONE)?;
//!
//! let mut input = InputState::new();
//! input.set_pointer(PointerSample::at(Vec3::new(2.0, 0.0, 3.0)));
//! system.update(&input, 1.0 / 60.0);
//! ```

pub mod input;
pub mod physics;
pub mod world;

// Placement modules (located in src/game/ directory)
#[path = "../../src/game/mod.rs"]
pub mod game;

// Re-export world types for convenience
pub use world::{AxisBounds, Frame, GridFrame, round_to_grid_local, snap_to_grid};
// Re-export commonly used input types
pub use input::{InputState, KeyBindings, KeyCode, PlacementAction, PointerSample};
