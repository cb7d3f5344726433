//! Building System
//!
//! Entry point for hosts: owns the scene (and with it the catalog), the
//! placement session, the tuning config and any set loads still in flight.
//! Each operation builds the payload and callbacks for one kind of request
//! and hands it to the session.

use glam::Vec3;
use log::{debug, info, warn};

use crate::input::InputState;

use super::catalog::PieceCatalog;
use super::collab::Collaborators;
use super::config::PlacementConfig;
use super::entity::EntityId;
use super::error::{PlacementError, Result};
use super::group::StaggeredLoader;
use super::save::SetData;
use super::scene::Scene;
use super::session::{
    Canceled, PlacePayload, PlacementCache, PlacementSession, Placed, SelectPayload, SessionContext, SessionEvent, StateKind,
    StrokePayload, Transition,
};
use super::stroke::StrokeCategory;

pub struct BuildingSystem {
    scene: Scene,
    session: PlacementSession,
    config: PlacementConfig,
    loaders: Vec<StaggeredLoader>,
}

/// Charge the committed entity's price.
fn debit_placed(ctx: &mut SessionContext<'_>, entity: EntityId) {
    let cost = ctx.cost_of(entity);
    if let Err(err) = ctx.services.economy.debit(cost) {
        ctx.report(&err);
    }
}

/// Spawn `piece` where `like` sits, for continuous placement.
fn spawn_like(scene: &mut Scene, piece: &str, like: EntityId) -> Option<EntityId> {
    let frame = scene.world_frame(like)?;
    let id = scene.spawn_piece(piece).ok()?;
    scene.set_world_frame(id, &frame);
    Some(id)
}

/// A fresh piece wrapped in its own editable set. Each confirm closes the
/// set and starts the next one from the same transform and cache.
fn piece_as_set_payload(piece: String, set: EntityId, entity: EntityId, cache: Option<PlacementCache>) -> PlacePayload {
    let mut payload = PlacePayload::new(entity)
        .in_scope(set)
        .on_placed(Box::new(move |ctx: &mut SessionContext<'_>, placed: &Placed| {
            debit_placed(ctx, placed.entity);
            ctx.scene.finalize(set);

            let next_set = ctx.scene.create_set(&ctx.config.default_set_name);
            ctx.scene.initialize_editable(next_set);
            let Some(next) = spawn_like(ctx.scene, &piece, placed.entity) else {
                ctx.scene.destroy(next_set);
                return None;
            };
            Some(Transition::Place(piece_as_set_payload(
                piece.clone(),
                next_set,
                next,
                Some(placed.cache.clone()),
            )))
        }))
        .on_cancel(Box::new(move |ctx: &mut SessionContext<'_>, canceled: Canceled| {
            if let Some(set) = canceled.scope {
                ctx.scene.destroy(set);
            }
        }));
    if let Some(cache) = cache {
        payload = payload.with_cache(cache);
    }
    payload
}

/// Another `piece` into an existing set, repeated until canceled.
fn piece_in_set_payload(piece: String, set: EntityId, entity: EntityId, cache: Option<PlacementCache>) -> PlacePayload {
    let mut payload = PlacePayload::new(entity)
        .in_scope(set)
        .on_placed(Box::new(move |ctx: &mut SessionContext<'_>, placed: &Placed| {
            debit_placed(ctx, placed.entity);
            let next = spawn_like(ctx.scene, &piece, placed.entity)?;
            Some(Transition::Place(piece_in_set_payload(
                piece.clone(),
                set,
                next,
                Some(placed.cache.clone()),
            )))
        }));
    if let Some(cache) = cache {
        payload = payload.with_cache(cache);
    }
    payload
}

impl BuildingSystem {
    pub fn new(catalog: PieceCatalog, services: Collaborators, config: PlacementConfig) -> Self {
        info!("[BuildingSystem] Ready with {} pieces", catalog.len());
        Self {
            scene: Scene::new(catalog),
            session: PlacementSession::new(services),
            config,
            loaders: Vec::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn session(&self) -> &PlacementSession {
        &self.session
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn state(&self) -> StateKind {
        self.session.state()
    }

    /// Whether any set is still being filled.
    pub fn is_loading(&self) -> bool {
        !self.loaders.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.session.drain_events()
    }

    fn request(&mut self, transition: Transition) -> Result<()> {
        self.session.request(&mut self.scene, &self.config, transition)
    }

    /// Request a placement; spawned entities are removed again if the
    /// session refuses it.
    fn request_place(&mut self, payload: PlacePayload, spawned: &[EntityId]) -> Result<()> {
        let result = self.request(Transition::Place(payload));
        if result.is_err() {
            for id in spawned {
                self.scene.destroy(*id);
            }
        }
        result
    }

    // ========================================================================
    // REQUESTS
    // ========================================================================

    /// Start placing `piece` inside a new editable set.
    ///
    /// On confirm the piece is charged, the set is finalized and placement
    /// continues with another piece of the same kind. Cancel removes the
    /// piece and its set.
    pub fn place_piece_as_set(&mut self, piece: &str, at: Vec3) -> Result<EntityId> {
        let entity = self.scene.spawn_piece(piece)?;
        self.scene.set_world_position(entity, at);
        let set = self.scene.create_set(&self.config.default_set_name);
        self.scene.set_world_position(set, at);
        self.scene.initialize_editable(set);

        let payload = piece_as_set_payload(piece.to_string(), set, entity, None);
        self.request_place(payload, &[entity, set])?;
        debug!("[BuildingSystem] Placing `{}` as set {}", piece, set);
        Ok(entity)
    }

    /// Start placing `piece` into an existing set, which stays editable.
    pub fn place_new_piece(&mut self, set: EntityId, piece: &str) -> Result<EntityId> {
        let at = self
            .scene
            .world_position(set)
            .ok_or(PlacementError::UnknownEntity(set))?;
        if self.scene.group(set).is_none() {
            return Err(PlacementError::UnknownEntity(set));
        }
        let entity = self.scene.spawn_piece(piece)?;
        self.scene.set_world_position(entity, at);
        self.scene.initialize_editable(set);

        let payload = piece_in_set_payload(piece.to_string(), set, entity, None);
        self.request_place(payload, &[entity])?;
        Ok(entity)
    }

    /// Start placing a whole set that has not been committed yet. Its
    /// members' prices are charged on confirm.
    pub fn place_set(&mut self, set: EntityId) -> Result<()> {
        if self.scene.group(set).is_none() {
            return Err(PlacementError::UnknownEntity(set));
        }
        let payload = PlacePayload::new(set).on_placed(Box::new(|ctx: &mut SessionContext<'_>, placed: &Placed| {
            debit_placed(ctx, placed.entity);
            None
        }));
        self.request(Transition::Place(payload))
    }

    /// Swap `target` for a new `piece` at the same transform and set.
    pub fn replace_placable(&mut self, target: EntityId, piece: &str) -> Result<EntityId> {
        let payload = PlacePayload::replacing(&mut self.scene, target, piece)?.on_placed(Box::new(
            |ctx: &mut SessionContext<'_>, placed: &Placed| {
                debit_placed(ctx, placed.entity);
                None
            },
        ));
        let entity = payload.entity;
        self.request_place(payload, &[entity])?;
        Ok(entity)
    }

    pub fn select_objects(&mut self, entities: Vec<EntityId>) -> Result<()> {
        self.request(Transition::Select(SelectPayload::new(entities)))
    }

    /// Start drawing connectors of `category`.
    pub fn stroke_placable(&mut self, category: StrokeCategory) -> Result<()> {
        self.request(Transition::Stroke(StrokePayload::new(category)))
    }

    /// Rebuild a saved set over the next frames. Returns the set id right
    /// away; members appear as [`update`](Self::update) runs.
    pub fn init_modular_set(&mut self, data: SetData, keep_editable: bool) -> EntityId {
        let loader = StaggeredLoader::new(&mut self.scene, data, self.config.frames_per_load, keep_editable);
        let set = loader.set();
        self.loaders.push(loader);
        set
    }

    /// Abandon the running interaction.
    pub fn cancel(&mut self) {
        self.session.cancel(&mut self.scene, &self.config);
    }

    // ========================================================================
    // FRAME
    // ========================================================================

    /// Advance the session and every pending load by one frame.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        self.session.update(&mut self.scene, &self.config, input, dt);

        for loader in &mut self.loaders {
            loader.process_next_batch(&mut self.scene);
        }
        self.loaders.retain(|loader| {
            if loader.is_done() && !self.scene.contains(loader.set()) {
                warn!("[BuildingSystem] Load of {} ended without a set", loader.set());
            }
            !loader.is_done()
        });
    }
}
