//! Groups (Sets)
//!
//! A set is an entity of kind `Set` plus an [`EntityGroup`] record holding
//! its members and shared grid. Members live in the set's local frame, the
//! set's bounds are the union of its active members, and its restrictions
//! are the most restrictive of theirs. All mutation goes through the
//! `Scene` methods in [`set`], which leave bounds and restrictions
//! consistent before returning.

pub mod loader;
pub mod set;

use glam::Vec3;

use super::entity::EntityId;
use super::restriction::RestrictionSet;

pub use loader::StaggeredLoader;
pub use set::SetFinalize;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup {
    /// Id of the set entity this record belongs to
    pub id: EntityId,
    pub name: String,
    /// Committed members in insertion order
    pub members: Vec<EntityId>,
    /// Entity currently being placed into the set (not yet a member)
    pub placing: Option<EntityId>,
    /// Authoring mode: an empty set survives while editing
    pub editing: bool,
    /// Grid anchor in the set's local space
    pub grid_center: Vec3,
    /// Minimum restrictions imposed on every member
    pub declared: RestrictionSet,
}

impl EntityGroup {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: Vec::new(),
            placing: None,
            editing: false,
            grid_center: Vec3::ZERO,
            declared: RestrictionSet::UNRESTRICTED,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
