//! Game Module
//!
//! The placement engine proper, built on the engine's frames, bounds and
//! input: restrictions and snapping, pieces and sets, stroke connectors and
//! the interactive placement session.

pub mod error;
pub mod config;

// Rules
pub mod restriction;
pub mod snap;

// Scene content
pub mod entity;
pub mod catalog;
pub mod scene;
pub mod group;
pub mod stroke;
pub mod save;

// Interaction
pub mod collab;
pub mod session;
pub mod system;

pub use error::{PlacementError, Result};
pub use config::PlacementConfig;

pub use restriction::{PositionRestriction, RestrictionSet, RotationRestriction, SpaceRestriction};
pub use snap::{SnapFrame, SnapPolicy, snap_position};

pub use entity::{EntityId, EntityKind, PlacableEntity, PlacementStatus};
pub use catalog::{PieceCatalog, PieceDefinition, ScaleAxis, ScaleMetrics};
pub use scene::{PlaceRequest, Scene, StackMode};
pub use group::{EntityGroup, StaggeredLoader};
pub use stroke::{ConnectionDirection, ConnectionDiff, StrokeCategory, StrokePlan, StrokeType};
pub use save::{PieceSaveData, PlacableData, SetData};

pub use session::{PlacementCache, PlacementSession, SessionEvent, StateKind, Transition};
pub use system::BuildingSystem;
