//! Placement Session
//!
//! The interaction state machine. Exactly one state is active:
//!
//! | State         | Entered by                                   |
//! |---------------|----------------------------------------------|
//! | Spectate      | default; confirm or cancel of any state      |
//! | SelectObjects | a selection request (from Spectate or itself) |
//! | PlaceObject   | a place request, replace, or a re-entry      |
//! | StrokePlace   | a stroke request from Spectate               |
//!
//! Transitions carry typed payloads. A request that arrives while a state
//! is busy interrupts it: the state's cache is stored for a later re-entry
//! of the same kind, its toolbar is closed and its cancel path runs before
//! the new state is entered.

pub mod cache;
pub mod payload;
mod place_object;
mod select_objects;
mod stroke_place;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::input::InputState;

use super::collab::{Collaborators, economy::cost_of};
use super::config::PlacementConfig;
use super::entity::EntityId;
use super::error::{PlacementError, Result};
use super::scene::Scene;
use super::stroke::StrokePlan;

pub use cache::{DetailSettings, FastPlaceAxis, HandleKind, PlacementCache, SelectCache, StrokeCache, StrokePhase};
pub use payload::{
    AdmissionFn, CancelFn, Canceled, PlacePayload, Placed, PlacedFn, SelectPayload, StrokeAdmissionFn, StrokePayload,
    StrokePointFn, Transition,
};

use place_object::PlaceObject;
use select_objects::SelectObjects;
use stroke_place::StrokePlace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Spectate,
    SelectObjects,
    PlaceObject,
    StrokePlace,
}

impl StateKind {
    /// Whether the machine may go from `self` to `to`.
    pub fn can_enter(self, to: StateKind) -> bool {
        use StateKind::*;
        matches!(
            (self, to),
            (_, Spectate)
                | (Spectate, PlaceObject | SelectObjects | StrokePlace)
                | (SelectObjects, SelectObjects | PlaceObject)
                | (PlaceObject, PlaceObject)
        )
    }
}

/// Things the host may want to react to (sounds, inspector refresh).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Entered(StateKind),
    Placed(EntityId),
    Canceled(EntityId),
    Deleted(EntityId),
    EditRequested(EntityId),
    Rejected(String),
}

/// What a state's frame step and the callbacks get to work with.
pub struct SessionContext<'a> {
    pub scene: &'a mut Scene,
    pub services: &'a mut Collaborators,
    pub config: &'a PlacementConfig,
    pub events: &'a mut Vec<SessionEvent>,
}

impl SessionContext<'_> {
    pub fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    /// Surface a refused operation to the user.
    pub fn report(&mut self, err: &PlacementError) {
        warn!("[Session] {}", err);
        let message = match err {
            PlacementError::InsufficientFunds { .. } => self.config.insufficient_funds_message.clone(),
            other => other.to_string(),
        };
        self.services.ui.show_message(&message);
        self.emit(SessionEvent::Rejected(message));
    }

    /// Default admission: the economy must cover the entity's price.
    pub fn check_funds(&self, cost: i64) -> Result<()> {
        let economy = &self.services.economy;
        if economy.can_afford(cost) {
            Ok(())
        } else {
            Err(PlacementError::InsufficientFunds {
                required: cost,
                available: economy.balance(),
            })
        }
    }

    pub fn cost_of(&self, id: EntityId) -> i64 {
        cost_of(self.scene, id)
    }
}

/// Admission used when a payload brings none: the entity's catalog price
/// must be covered by the balance.
pub fn funds_admission(ctx: &mut SessionContext<'_>, entity: EntityId) -> Result<()> {
    let cost = ctx.cost_of(entity);
    ctx.check_funds(cost)
}

/// Result of one frame of a state.
pub(crate) enum Flow {
    Continue,
    /// The state finished; `None` returns to Spectate
    Exit(Option<Transition>),
}

enum ActiveState {
    Spectate,
    Select(SelectObjects),
    Place(PlaceObject),
    Stroke(StrokePlace),
}

impl ActiveState {
    fn kind(&self) -> StateKind {
        match self {
            ActiveState::Spectate => StateKind::Spectate,
            ActiveState::Select(_) => StateKind::SelectObjects,
            ActiveState::Place(_) => StateKind::PlaceObject,
            ActiveState::Stroke(_) => StateKind::StrokePlace,
        }
    }
}

/// Caches of interrupted states, consumed by the next entry of that kind.
#[derive(Debug, Default)]
struct Suspended {
    place: Option<PlacementCache>,
    select: Option<SelectCache>,
    stroke: Option<StrokeCache>,
}

pub struct PlacementSession {
    state: ActiveState,
    services: Collaborators,
    suspended: Suspended,
    events: Vec<SessionEvent>,
}

impl PlacementSession {
    pub fn new(services: Collaborators) -> Self {
        Self {
            state: ActiveState::Spectate,
            services,
            suspended: Suspended::default(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> StateKind {
        self.state.kind()
    }

    pub fn services(&self) -> &Collaborators {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Collaborators {
        &mut self.services
    }

    /// Entity following the pointer, if placing.
    pub fn placing(&self) -> Option<EntityId> {
        match &self.state {
            ActiveState::Place(state) => Some(state.entity()),
            _ => None,
        }
    }

    /// Cache of the running placement.
    pub fn placement_cache(&self) -> Option<&PlacementCache> {
        match &self.state {
            ActiveState::Place(state) => Some(state.cache()),
            _ => None,
        }
    }

    pub fn selection(&self) -> &[EntityId] {
        match &self.state {
            ActiveState::Select(state) => state.entities(),
            _ => &[],
        }
    }

    pub fn select_cache(&self) -> Option<&SelectCache> {
        match &self.state {
            ActiveState::Select(state) => Some(state.cache()),
            _ => None,
        }
    }

    /// Points the running stroke would commit.
    pub fn stroke_preview(&self) -> Option<&StrokePlan> {
        match &self.state {
            ActiveState::Stroke(state) => state.preview(),
            _ => None,
        }
    }

    pub fn stroke_cache(&self) -> Option<&StrokeCache> {
        match &self.state {
            ActiveState::Stroke(state) => Some(state.cache()),
            _ => None,
        }
    }

    /// Cache waiting for the next entry of `kind`.
    pub fn is_suspended(&self, kind: StateKind) -> bool {
        match kind {
            StateKind::Spectate => false,
            StateKind::SelectObjects => self.suspended.select.is_some(),
            StateKind::PlaceObject => self.suspended.place.is_some(),
            StateKind::StrokePlace => self.suspended.stroke.is_some(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Request a state change from outside the frame loop.
    ///
    /// A busy state is interrupted first. Disallowed transitions return an
    /// error and leave the current state running.
    pub fn request(&mut self, scene: &mut Scene, config: &PlacementConfig, transition: Transition) -> Result<()> {
        let from = self.state.kind();
        let to = transition.kind();
        if !from.can_enter(to) {
            return Err(PlacementError::InvalidTransition { from, to });
        }
        self.interrupt(scene, config);
        self.enter(scene, config, transition)
    }

    /// Cancel whatever is running and return to Spectate.
    pub fn cancel(&mut self, scene: &mut Scene, config: &PlacementConfig) {
        self.interrupt(scene, config);
        self.enter_spectate();
    }

    fn interrupt(&mut self, scene: &mut Scene, config: &PlacementConfig) {
        let state = std::mem::replace(&mut self.state, ActiveState::Spectate);
        if matches!(state, ActiveState::Spectate) {
            return;
        }
        debug!("[Session] Interrupting {:?}", state.kind());
        let mut ctx = SessionContext {
            scene,
            services: &mut self.services,
            config,
            events: &mut self.events,
        };
        match state {
            ActiveState::Spectate => {}
            ActiveState::Place(state) => {
                let mut cache = state.interrupt(&mut ctx);
                close_toolbar(&mut ctx, cache.toolbar.take());
                self.suspended.place = Some(cache);
            }
            ActiveState::Select(state) => {
                let mut cache = state.interrupt(&mut ctx);
                close_toolbar(&mut ctx, cache.toolbar.take());
                self.suspended.select = Some(cache);
            }
            ActiveState::Stroke(state) => {
                let mut cache = state.interrupt(&mut ctx);
                close_toolbar(&mut ctx, cache.toolbar.take());
                self.suspended.stroke = Some(cache);
            }
        }
    }

    fn enter(&mut self, scene: &mut Scene, config: &PlacementConfig, transition: Transition) -> Result<()> {
        let kind = transition.kind();
        let mut ctx = SessionContext {
            scene,
            services: &mut self.services,
            config,
            events: &mut self.events,
        };
        let state = match transition {
            Transition::Spectate => ActiveState::Spectate,
            Transition::Place(payload) => {
                let resume = self.suspended.place.take();
                ActiveState::Place(PlaceObject::enter(&mut ctx, payload, resume)?)
            }
            Transition::Select(payload) => {
                let resume = self.suspended.select.take();
                ActiveState::Select(SelectObjects::enter(&mut ctx, payload, resume)?)
            }
            Transition::Stroke(payload) => {
                let resume = self.suspended.stroke.take();
                ActiveState::Stroke(StrokePlace::enter(&mut ctx, payload, resume)?)
            }
        };
        info!("[Session] Entered {:?}", kind);
        ctx.emit(SessionEvent::Entered(kind));
        self.state = state;
        Ok(())
    }

    fn enter_spectate(&mut self) {
        if !matches!(self.state, ActiveState::Spectate) {
            self.state = ActiveState::Spectate;
        }
        info!("[Session] Entered {:?}", StateKind::Spectate);
        self.events.push(SessionEvent::Entered(StateKind::Spectate));
    }

    // ========================================================================
    // FRAME
    // ========================================================================

    /// Run the active state for one frame.
    pub fn update(&mut self, scene: &mut Scene, config: &PlacementConfig, input: &InputState, dt: f32) {
        let from = self.state.kind();
        let mut ctx = SessionContext {
            scene: &mut *scene,
            services: &mut self.services,
            config,
            events: &mut self.events,
        };
        let (flow, toolbar) = match &mut self.state {
            ActiveState::Spectate => return,
            ActiveState::Place(state) => (state.update(&mut ctx, input, dt), state.cache().toolbar),
            ActiveState::Select(state) => (state.update(&mut ctx, input, dt), state.cache().toolbar),
            ActiveState::Stroke(state) => (state.update(&mut ctx, input, dt), state.cache().toolbar),
        };
        let Flow::Exit(next) = flow else {
            return;
        };

        let next = match next {
            Some(next) if from.can_enter(next.kind()) => next,
            Some(next) => {
                warn!("[Session] {:?} cannot follow {:?}, returning to Spectate", next.kind(), from);
                Transition::Spectate
            }
            None => Transition::Spectate,
        };
        // A re-entry that carries the open toolbar keeps it
        if toolbar.is_some() && toolbar != next.toolbar() {
            close_toolbar(&mut ctx, toolbar);
        }

        self.state = ActiveState::Spectate;
        if matches!(next, Transition::Spectate) {
            self.enter_spectate();
        } else if let Err(err) = self.enter(scene, config, next) {
            warn!("[Session] Could not enter next state: {}", err);
            self.enter_spectate();
        }
    }
}

fn close_toolbar(ctx: &mut SessionContext<'_>, toolbar: Option<crate::game::collab::ToolbarHandle>) {
    if let Some(handle) = toolbar {
        ctx.services.ui.close(handle);
    }
}
