//! Entities
//!
//! Pieces and sets share one representation, [`PlacableEntity`], and are
//! owned by the scene arena. Everything else refers to them by [`EntityId`].

pub mod kind;
pub mod placable;
pub mod rotation;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use kind::{EntityKind, KindCapabilities};
pub use placable::{GridMemo, PlacableEntity, PlacementStatus, StrokeLink};
pub use rotation::{SplitRotation, from_euler_degrees, to_euler_degrees};

/// Arena handle of a piece or set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

static_assertions::assert_eq_size!(EntityId, u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
