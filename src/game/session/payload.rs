//! Transition Payloads
//!
//! Everything a state needs is handed to it when it is entered: the
//! entities involved, an optional cache to resume from and the caller's
//! callbacks. Callbacks receive the [`SessionContext`] so they can act on
//! the scene and collaborators without reaching for global state.

use std::fmt;

use crate::game::collab::ToolbarHandle;
use crate::game::entity::EntityId;
use crate::game::error::{PlacementError, Result};
use crate::game::scene::Scene;
use crate::game::stroke::StrokeCategory;

use super::cache::{PlacementCache, SelectCache, StrokeCache};
use super::{SessionContext, StateKind};

/// Decides whether the entity may be committed. `Err` leaves the
/// interaction untouched and is shown to the user.
pub type AdmissionFn = Box<dyn FnMut(&mut SessionContext<'_>, EntityId) -> Result<()>>;

/// Runs after a commit; may ask for the next state (e.g. keep placing).
pub type PlacedFn = Box<dyn FnMut(&mut SessionContext<'_>, &Placed) -> Option<Transition>>;

/// Runs after the in-flight entity was destroyed.
pub type CancelFn = Box<dyn FnOnce(&mut SessionContext<'_>, Canceled)>;

/// Admission for a stroke commit, given the number of connectors it creates.
pub type StrokeAdmissionFn = Box<dyn FnMut(&mut SessionContext<'_>, usize) -> Result<()>>;

/// Per-connector notification of a stroke commit.
pub type StrokePointFn = Box<dyn FnMut(&mut SessionContext<'_>, EntityId)>;

/// Passed to [`PlacedFn`] after a successful commit.
#[derive(Debug, Clone)]
pub struct Placed {
    pub entity: EntityId,
    /// Set the entity was committed into
    pub scope: Option<EntityId>,
    /// Entity the commit replaced (already destroyed)
    pub replaced: Option<EntityId>,
    /// Interaction state at the moment of the commit
    pub cache: PlacementCache,
}

/// Passed to [`CancelFn`]. `entity` no longer exists in the scene.
#[derive(Debug, Clone)]
pub struct Canceled {
    pub entity: EntityId,
    pub scope: Option<EntityId>,
    pub cache: PlacementCache,
}

pub struct PlacePayload {
    pub entity: EntityId,
    pub scope: Option<EntityId>,
    pub replacing: Option<EntityId>,
    pub cache: Option<PlacementCache>,
    pub admission: Option<AdmissionFn>,
    pub on_placed: Option<PlacedFn>,
    pub on_cancel: Option<CancelFn>,
}

impl PlacePayload {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            scope: None,
            replacing: None,
            cache: None,
            admission: None,
            on_placed: None,
            on_cancel: None,
        }
    }

    /// Spawn `piece` to take the place of `target`.
    ///
    /// The new entity starts at the target's world transform and is placed
    /// into the target's set. The target stays hidden while placing and is
    /// destroyed on confirm or shown again on cancel.
    pub fn replacing(scene: &mut Scene, target: EntityId, piece: &str) -> Result<Self> {
        let frame = scene.world_frame(target).ok_or(PlacementError::UnknownEntity(target))?;
        let scope = scene.get(target).and_then(|e| e.parent);
        let entity = scene.spawn_piece(piece)?;
        scene.set_world_frame(entity, &frame);
        Ok(Self {
            scope,
            replacing: Some(target),
            ..Self::new(entity)
        })
    }

    pub fn in_scope(mut self, set: EntityId) -> Self {
        self.scope = Some(set);
        self
    }

    pub fn with_cache(mut self, cache: PlacementCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_admission(mut self, admission: AdmissionFn) -> Self {
        self.admission = Some(admission);
        self
    }

    pub fn on_placed(mut self, callback: PlacedFn) -> Self {
        self.on_placed = Some(callback);
        self
    }

    pub fn on_cancel(mut self, callback: CancelFn) -> Self {
        self.on_cancel = Some(callback);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectPayload {
    pub entities: Vec<EntityId>,
    pub cache: Option<SelectCache>,
}

impl SelectPayload {
    pub fn new(entities: Vec<EntityId>) -> Self {
        Self { entities, cache: None }
    }

    pub fn with_cache(mut self, cache: SelectCache) -> Self {
        self.cache = Some(cache);
        self
    }
}

pub struct StrokePayload {
    pub category: StrokeCategory,
    pub cache: Option<StrokeCache>,
    pub admission: Option<StrokeAdmissionFn>,
    pub on_point_placed: Option<StrokePointFn>,
    pub on_point_deleted: Option<StrokePointFn>,
}

impl StrokePayload {
    pub fn new(category: StrokeCategory) -> Self {
        Self {
            category,
            cache: None,
            admission: None,
            on_point_placed: None,
            on_point_deleted: None,
        }
    }

    pub fn with_admission(mut self, admission: StrokeAdmissionFn) -> Self {
        self.admission = Some(admission);
        self
    }

    pub fn on_point_placed(mut self, callback: StrokePointFn) -> Self {
        self.on_point_placed = Some(callback);
        self
    }

    pub fn on_point_deleted(mut self, callback: StrokePointFn) -> Self {
        self.on_point_deleted = Some(callback);
        self
    }
}

/// A requested state change with its payload.
pub enum Transition {
    Spectate,
    Select(SelectPayload),
    Place(PlacePayload),
    Stroke(StrokePayload),
}

impl Transition {
    pub fn kind(&self) -> StateKind {
        match self {
            Transition::Spectate => StateKind::Spectate,
            Transition::Select(_) => StateKind::SelectObjects,
            Transition::Place(_) => StateKind::PlaceObject,
            Transition::Stroke(_) => StateKind::StrokePlace,
        }
    }

    /// Toolbar the payload's cache still holds open.
    pub(crate) fn toolbar(&self) -> Option<ToolbarHandle> {
        match self {
            Transition::Spectate => None,
            Transition::Select(p) => p.cache.as_ref().and_then(|c| c.toolbar),
            Transition::Place(p) => p.cache.as_ref().and_then(|c| c.toolbar),
            Transition::Stroke(p) => p.cache.as_ref().and_then(|c| c.toolbar),
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Spectate => write!(f, "Spectate"),
            Transition::Select(p) => write!(f, "Select({:?})", p.entities),
            Transition::Place(p) => write!(f, "Place({})", p.entity),
            Transition::Stroke(p) => write!(f, "Stroke({:?})", p.category),
        }
    }
}
