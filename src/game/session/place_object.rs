//! PlaceObject State
//!
//! An entity follows the pointer through the placement pipeline until it
//! is confirmed or canceled. Rotate taps turn it by a fixed step, holding
//! rotate turns it continuously with horizontal pointer movement, and
//! fast placement lifts or slides it relative to where the drag started.

use glam::{Quat, Vec3};
use log::{debug, info, warn};

use crate::game::collab::{PanelKind, ToolbarAction, ToolbarHandle, ToolbarRequest};
use crate::game::entity::{EntityId, PlacementStatus};
use crate::game::error::{PlacementError, Result};
use crate::game::restriction::RestrictionSet;
use crate::game::scene::{PlaceRequest, StackMode, UndoRecord};
use crate::game::snap::SnapPolicy;
use crate::input::{InputState, PlacementAction, PointerSample};

use super::cache::{FastPlaceAxis, PlacementCache};
use super::payload::{AdmissionFn, CancelFn, Canceled, PlacePayload, Placed, PlacedFn};
use super::{Flow, SessionContext, SessionEvent, funds_admission};

pub(super) struct PlaceObject {
    entity: EntityId,
    scope: Option<EntityId>,
    replacing: Option<EntityId>,
    cache: PlacementCache,
    admission: Option<AdmissionFn>,
    on_placed: Option<PlacedFn>,
    on_cancel: Option<CancelFn>,
}

impl PlaceObject {
    pub(super) fn enter(
        ctx: &mut SessionContext<'_>,
        payload: PlacePayload,
        resume: Option<PlacementCache>,
    ) -> Result<Self> {
        let entity = payload.entity;
        let (own_snap, defines_boundary, scale) = ctx
            .scene
            .get(entity)
            .map(|e| (e.snap, e.defines_boundary(), e.scale))
            .ok_or(PlacementError::UnknownEntity(entity))?;
        if let Some(set) = payload.scope
            && ctx.scene.group(set).is_none()
        {
            return Err(PlacementError::UnknownEntity(set));
        }

        let fresh = payload.cache.is_none() && resume.is_none();
        let mut cache = payload
            .cache
            .or(resume)
            .unwrap_or_else(|| PlacementCache::for_entity(own_snap, defines_boundary));
        if fresh {
            cache.detail.scale = scale;
        } else if ctx.scene.effective_restrictions(entity).scalable {
            let scale = cache.detail.clamped_scale(ctx.config.minimum_scale);
            if let Some(e) = ctx.scene.get_mut(entity) {
                e.scale = scale;
            }
        }

        if let Some(target) = payload.replacing {
            ctx.scene.set_active(target, false);
        }
        if let Some(set) = payload.scope {
            ctx.scene.register_placing(set, entity);
        }
        ctx.scene.set_status(entity, PlacementStatus::Live);
        if let Some(e) = ctx.scene.get_mut(entity) {
            e.memo.last_y_stack = cache.last_y_stack;
            if !cache.colors.is_empty() && cache.colors.len() == e.colors.len() {
                e.colors = cache.colors.clone();
            }
        }

        if cache.toolbar.is_none() {
            cache.toolbar = Some(open_toolbar(ctx, entity));
        }
        debug!("[PlaceObject] Placing {} (scope {:?})", entity, payload.scope);

        Ok(Self {
            entity,
            scope: payload.scope,
            replacing: payload.replacing,
            cache,
            admission: payload.admission,
            on_placed: payload.on_placed,
            on_cancel: payload.on_cancel,
        })
    }

    pub(super) fn entity(&self) -> EntityId {
        self.entity
    }

    pub(super) fn cache(&self) -> &PlacementCache {
        &self.cache
    }

    pub(super) fn update(&mut self, ctx: &mut SessionContext<'_>, input: &InputState, dt: f32) -> Flow {
        if !ctx.scene.contains(self.entity) {
            warn!("[PlaceObject] {} disappeared while placing", self.entity);
            return Flow::Exit(None);
        }

        for action in ctx.services.ui.poll_actions(PanelKind::Placement) {
            match action {
                ToolbarAction::Confirm => {
                    if let Flow::Exit(next) = self.confirm(ctx) {
                        return Flow::Exit(next);
                    }
                }
                ToolbarAction::Cancel => return self.cancel(ctx),
                ToolbarAction::Rotate => self.rotate_tap(ctx),
                ToolbarAction::SetSnap(policy) => self.cache.snap = policy,
                ToolbarAction::SetStacking(mode) => self.cache.stack = mode,
                ToolbarAction::ToggleAlign => self.cache.align = !self.cache.align,
                ToolbarAction::ToggleLocalSpace => self.cache.local_space = !self.cache.local_space,
                ToolbarAction::Recolor { slot, key } => self.recolor(ctx, slot, key),
                ToolbarAction::Rescale { scale } => self.rescale(ctx, scale),
                other => debug!("[PlaceObject] Ignoring {:?}", other),
            }
        }

        let pointer = input.pointer().copied();
        self.handle_rotate_key(ctx, input, pointer, dt);
        self.handle_fast_place(ctx, input, pointer);

        if let Some(pointer) = pointer {
            if self.cache.is_rotating {
                self.rotate_towards(ctx, &pointer);
            } else if self.cache.is_fast_placing {
                self.fast_place(ctx, &pointer);
            } else {
                self.follow(ctx, &pointer);
            }
        }

        if input.action_just_pressed(PlacementAction::Cancel) {
            return self.cancel(ctx);
        }
        if input.action_just_pressed(PlacementAction::Confirm) {
            return self.confirm(ctx);
        }
        Flow::Continue
    }

    /// Leave without committing. The cache is kept as-is, rotation and
    /// fast placement in progress included, for the next placement.
    pub(super) fn interrupt(mut self, ctx: &mut SessionContext<'_>) -> PlacementCache {
        self.cancel(ctx);
        self.cache
    }

    // ========================================================================
    // POSITIONING
    // ========================================================================

    /// Normal frame: snap to the pointer, then settle by stacking.
    fn follow(&mut self, ctx: &mut SessionContext<'_>, pointer: &PointerSample) {
        let request = PlaceRequest::new(pointer.position)
            .with_policy(self.cache.snap)
            .with_normal(self.cache.align.then_some(pointer.normal))
            .in_local_space(self.cache.local_space)
            .with_offset(self.cache.fast_place_offset);
        ctx.scene.place_at(self.entity, request);
        if let Some(y) = ctx
            .scene
            .auto_stack(self.entity, self.cache.stack, ctx.config.stack_iteration_limit)
        {
            self.cache.last_y_stack = y;
        }
    }

    fn handle_fast_place(&mut self, ctx: &mut SessionContext<'_>, input: &InputState, pointer: Option<PointerSample>) {
        if !self.cache.is_fast_placing {
            if input.action_just_pressed(PlacementAction::FastPlace)
                && let Some(pointer) = pointer
            {
                let axis = if input.action_pressed(PlacementAction::FastPlaceHorizontal) {
                    FastPlaceAxis::Horizontal
                } else {
                    FastPlaceAxis::Vertical
                };
                self.begin_fast_place(ctx, &pointer, axis);
            }
            return;
        }

        let released = !input.action_pressed(PlacementAction::FastPlace)
            || (self.cache.fast_place_axis == FastPlaceAxis::Horizontal
                && !input.action_pressed(PlacementAction::FastPlaceHorizontal));
        if released {
            let Some(position) = ctx.scene.world_position(self.entity) else {
                return;
            };
            self.cache.settle_fast_place(position);
            if let Some(e) = ctx.scene.get_mut(self.entity) {
                e.memo.last_y_stack = self.cache.last_y_stack;
            }
            debug!("[PlaceObject] Fast place offset now {:?}", self.cache.fast_place_offset);
        }
    }

    fn begin_fast_place(&mut self, ctx: &mut SessionContext<'_>, pointer: &PointerSample, axis: FastPlaceAxis) {
        let Some(start) = ctx.scene.world_position(self.entity) else {
            return;
        };
        self.cache.is_fast_placing = true;
        self.cache.fast_place_axis = axis;
        self.cache.fast_place_set_offset = axis == FastPlaceAxis::Vertical;
        self.cache.fast_place_start = start;
        self.cache.fast_place_pointer = pointer.position;
        self.cache.fast_place_screen = pointer.screen;
    }

    /// Move relative to the drag start: vertically with the screen lift, or
    /// horizontally along the dominant axis of the pointer movement.
    fn fast_place(&mut self, ctx: &mut SessionContext<'_>, pointer: &PointerSample) {
        let offset = match self.cache.fast_place_axis {
            FastPlaceAxis::Vertical => {
                let lift = (self.cache.fast_place_screen.y - pointer.screen.y) * ctx.config.pointer_axis_scale;
                Vec3::Y * lift
            }
            FastPlaceAxis::Horizontal => {
                let reference = if self.cache.local_space {
                    ctx.scene.local_space(self.entity).unwrap_or(Quat::IDENTITY)
                } else {
                    Quat::IDENTITY
                };
                let local = reference.inverse() * (pointer.position - self.cache.fast_place_pointer);
                let dominant = if local.x.abs() >= local.z.abs() {
                    Vec3::new(local.x, 0.0, 0.0)
                } else {
                    Vec3::new(0.0, 0.0, local.z)
                };
                reference * dominant
            }
        };
        let request = PlaceRequest::new(self.cache.fast_place_start + offset)
            .with_policy(self.cache.snap)
            .in_local_space(self.cache.local_space);
        ctx.scene.place_at(self.entity, request);
    }

    // ========================================================================
    // ROTATION
    // ========================================================================

    fn handle_rotate_key(
        &mut self,
        ctx: &mut SessionContext<'_>,
        input: &InputState,
        pointer: Option<PointerSample>,
        dt: f32,
    ) {
        if input.action_just_pressed(PlacementAction::Rotate) {
            self.cache.rotate_held = Some(0.0);
        }
        let Some(held) = self.cache.rotate_held else {
            return;
        };
        if input.action_pressed(PlacementAction::Rotate) {
            let held = held + dt;
            self.cache.rotate_held = Some(held);
            if !self.cache.is_rotating && held >= ctx.config.rotation_delay {
                self.begin_rotation(ctx, pointer);
            }
        } else {
            if !self.cache.is_rotating {
                self.rotate_tap(ctx);
            }
            self.cache.rotate_held = None;
            self.cache.is_rotating = false;
        }
    }

    fn rotate_tap(&mut self, ctx: &mut SessionContext<'_>) {
        if let Some(e) = ctx.scene.get_mut(self.entity) {
            e.rotation.add_yaw(ctx.config.tap_rotation_step);
        }
    }

    fn begin_rotation(&mut self, ctx: &mut SessionContext<'_>, pointer: Option<PointerSample>) {
        let Some(offset) = ctx.scene.get(self.entity).map(|e| e.rotation.offset) else {
            return;
        };
        self.cache.is_rotating = true;
        self.cache.start_rotation = offset;
        self.cache.snap_rotation = offset;
        self.cache.last_screen_x = pointer.map(|p| p.screen.x).unwrap_or(0.0);
    }

    /// Continuous rotation: horizontal pointer movement drives the yaw, the
    /// written offset is snapped to the coarser of the configured snap and
    /// the entity's own rotation step.
    fn rotate_towards(&mut self, ctx: &mut SessionContext<'_>, pointer: &PointerSample) {
        let dx = (pointer.screen.x - self.cache.last_screen_x) * ctx.config.pointer_axis_scale;
        self.cache.last_screen_x = pointer.screen.x;
        let yaw = Quat::from_rotation_y((dx * ctx.config.rotation_speed).to_radians());
        self.cache.snap_rotation = (self.cache.snap_rotation * yaw).normalize();

        let step = ctx
            .config
            .rotation_snap
            .max(ctx.scene.effective_restrictions(self.entity).rotation_step);
        let snapped = RestrictionSet {
            rotation_step: step,
            ..RestrictionSet::UNRESTRICTED
        }
        .restrict_rotation(self.cache.snap_rotation);
        if let Some(e) = ctx.scene.get_mut(self.entity) {
            e.rotation.offset = snapped;
        }
    }

    // ========================================================================
    // DETAIL SETTINGS
    // ========================================================================

    fn recolor(&mut self, ctx: &mut SessionContext<'_>, slot: usize, key: String) {
        let Some(e) = ctx.scene.get_mut(self.entity) else {
            return;
        };
        if self.cache.colors.len() != e.colors.len() {
            self.cache.colors = e.colors.clone();
        }
        if slot < e.colors.len() {
            e.colors[slot] = key.clone();
            self.cache.colors[slot] = key;
        } else {
            debug!("[PlaceObject] {} has no color slot {}", self.entity, slot);
        }
    }

    fn rescale(&mut self, ctx: &mut SessionContext<'_>, scale: Vec3) {
        if !ctx.scene.effective_restrictions(self.entity).scalable {
            debug!("[PlaceObject] {} is not scalable", self.entity);
            return;
        }
        self.cache.detail.scale = scale;
        let clamped = self.cache.detail.clamped_scale(ctx.config.minimum_scale);
        if let Some(e) = ctx.scene.get_mut(self.entity) {
            e.scale = clamped;
        }
    }

    // ========================================================================
    // COMMIT / CANCEL
    // ========================================================================

    fn confirm(&mut self, ctx: &mut SessionContext<'_>) -> Flow {
        let admitted = match self.admission.as_mut() {
            Some(admission) => admission(ctx, self.entity),
            None => funds_admission(ctx, self.entity),
        };
        if let Err(err) = admitted {
            ctx.report(&err);
            return Flow::Continue;
        }

        if let Some(position) = ctx.scene.world_position(self.entity) {
            self.cache.settle_fast_place(position);
        }
        self.cache.reset_interaction();

        match self.scope {
            Some(set) => {
                ctx.scene.deregister_placing(set);
                ctx.scene.add_member(set, self.entity);
            }
            None => ctx.scene.set_status(self.entity, PlacementStatus::Placed),
        }
        if let Some(target) = self.replacing {
            ctx.services.undo.clear_for(&[target]);
            ctx.scene.destroy(target);
        }
        if ctx.scene.get(self.entity).is_some_and(|e| e.is_stroke()) {
            ctx.scene
                .reconcile_around(&[self.entity], ctx.services.spatial.as_ref(), ctx.config.connection_distance);
        }
        ctx.services.undo.register(UndoRecord::Placed { entity: self.entity });

        info!("[PlaceObject] Placed {} (scope {:?})", self.entity, self.scope);
        ctx.emit(SessionEvent::Placed(self.entity));

        let placed = Placed {
            entity: self.entity,
            scope: self.scope,
            replaced: self.replacing,
            cache: self.cache.clone(),
        };
        let next = self.on_placed.as_mut().and_then(|callback| callback(ctx, &placed));
        Flow::Exit(next)
    }

    fn cancel(&mut self, ctx: &mut SessionContext<'_>) -> Flow {
        if let Some(set) = self.scope {
            ctx.scene.remove_member(set, self.entity);
        }
        ctx.scene.destroy(self.entity);
        if let Some(target) = self.replacing {
            ctx.scene.set_active(target, true);
        }
        debug!("[PlaceObject] Canceled {}", self.entity);
        ctx.emit(SessionEvent::Canceled(self.entity));

        if let Some(callback) = self.on_cancel.take() {
            callback(
                ctx,
                Canceled {
                    entity: self.entity,
                    scope: self.scope,
                    cache: self.cache.clone(),
                },
            );
        }
        Flow::Exit(None)
    }
}

fn open_toolbar(ctx: &mut SessionContext<'_>, entity: EntityId) -> ToolbarHandle {
    let mut actions = vec![
        ToolbarAction::Confirm,
        ToolbarAction::Cancel,
        ToolbarAction::Rotate,
        ToolbarAction::ToggleAlign,
        ToolbarAction::ToggleLocalSpace,
    ];
    actions.extend(
        [SnapPolicy::FreeForm, SnapPolicy::Center, SnapPolicy::Edge, SnapPolicy::Cross].map(ToolbarAction::SetSnap),
    );
    actions.extend([StackMode::Boundary, StackMode::Center, StackMode::Disabled].map(ToolbarAction::SetStacking));
    ctx.services.ui.open(ToolbarRequest {
        panel: PanelKind::Placement,
        entities: vec![entity],
        actions,
    })
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use crate::game::catalog::{PieceCatalog, PieceDefinition};
    use crate::game::collab::{Collaborators, RecordingToolbar};
    use crate::game::config::PlacementConfig;
    use crate::game::entity::EntityKind;
    use crate::game::scene::Scene;
    use crate::game::session::{PlacementSession, StateKind, Transition};
    use crate::input::KeyCode;

    use super::*;

    struct Harness {
        scene: Scene,
        session: PlacementSession,
        config: PlacementConfig,
        toolbar: RecordingToolbar,
        input: InputState,
    }

    impl Harness {
        fn new(balance: i64) -> Self {
            let toolbar = RecordingToolbar::new();
            let services = Collaborators::in_memory(balance).with_ui(Box::new(toolbar.clone()));
            let scene = Scene::new(
                PieceCatalog::new()
                    .with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE).with_price(5))
                    .with(PieceDefinition::new("foundation", EntityKind::Core, Vec3::new(2.0, 0.5, 2.0))),
            );
            Self {
                scene,
                session: PlacementSession::new(services),
                config: PlacementConfig::default(),
                toolbar,
                input: InputState::new(),
            }
        }

        fn place(&mut self, piece: &str) -> EntityId {
            let id = self.scene.spawn_piece(piece).expect("known piece");
            self.session
                .request(&mut self.scene, &self.config, Transition::Place(PlacePayload::new(id)))
                .expect("spectate can place");
            id
        }

        fn frame(&mut self) {
            self.session.update(&mut self.scene, &self.config, &self.input, 1.0 / 60.0);
            self.input.end_frame();
        }

        fn click(&mut self) {
            self.input.handle_key(KeyCode::MouseLeft, true);
            self.frame();
            self.input.handle_key(KeyCode::MouseLeft, false);
            self.frame();
        }
    }

    #[test]
    fn test_confirm_commits_and_returns_to_spectate() {
        let mut h = Harness::new(10);
        let id = h.place("crate");
        assert!(h.toolbar.is_open(PanelKind::Placement));

        h.input.set_pointer(PointerSample::at(Vec3::new(2.3, 0.0, 3.6)));
        h.click();

        assert_eq!(h.session.state(), StateKind::Spectate);
        let entity = h.scene.get(id).expect("committed entity stays");
        assert_eq!(entity.status, PlacementStatus::Placed);
        assert!(!h.toolbar.is_open(PanelKind::Placement));
        assert_eq!(h.session.services().undo.len(), 1);
        assert!(h.session.drain_events().contains(&SessionEvent::Placed(id)));
    }

    #[test]
    fn test_insufficient_funds_keeps_placing() {
        let mut h = Harness::new(0);
        let id = h.place("crate");
        h.input.set_pointer(PointerSample::at(Vec3::ZERO));
        h.click();

        assert_eq!(h.session.state(), StateKind::PlaceObject);
        assert_eq!(h.session.placing(), Some(id));
        assert_eq!(h.toolbar.messages(), vec![h.config.insufficient_funds_message.clone()]);
    }

    #[test]
    fn test_cancel_destroys_and_restores_replaced() {
        let mut h = Harness::new(10);
        let target = h.scene.spawn_piece("crate").expect("known piece");
        h.scene.set_world_position(target, Vec3::new(4.0, 0.0, 0.0));
        h.scene.set_status(target, PlacementStatus::Placed);

        let payload = PlacePayload::replacing(&mut h.scene, target, "crate").expect("target exists");
        let replacement = payload.entity;
        h.session
            .request(&mut h.scene, &h.config, Transition::Place(payload))
            .expect("spectate can place");
        assert!(!h.scene.get(target).expect("hidden, not destroyed").active);

        h.input.handle_key(KeyCode::Escape, true);
        h.frame();

        assert_eq!(h.session.state(), StateKind::Spectate);
        assert!(!h.scene.contains(replacement));
        assert!(h.scene.get(target).expect("restored").active);
    }

    #[test]
    fn test_replace_destroys_target_on_confirm() {
        let mut h = Harness::new(10);
        let set = h.scene.create_set("yard");
        let target = h.scene.spawn_piece("crate").expect("known piece");
        h.scene.add_member(set, target);
        let other = h.scene.spawn_piece("crate").expect("known piece");
        h.scene.set_world_position(other, Vec3::new(5.0, 0.0, 0.0));
        h.scene.add_member(set, other);

        let payload = PlacePayload::replacing(&mut h.scene, target, "crate").expect("target exists");
        let replacement = payload.entity;
        h.session
            .request(&mut h.scene, &h.config, Transition::Place(payload))
            .expect("spectate can place");
        h.input.handle_key(KeyCode::MouseLeft, true);
        h.frame();

        assert!(!h.scene.contains(target));
        assert!(h.scene.is_member(set, replacement));
        assert!(h.scene.is_member(set, other));
    }

    #[test]
    fn test_rotate_tap_turns_quarter() {
        let mut h = Harness::new(10);
        let id = h.place("crate");
        h.input.handle_key(KeyCode::KeyR, true);
        h.frame();
        h.input.handle_key(KeyCode::KeyR, false);
        h.frame();

        let offset = h.scene.get(id).expect("placing").rotation.offset;
        assert!(offset.dot(Quat::from_rotation_y(90f32.to_radians())).abs() > 1.0 - 1e-6);
        assert!(!h.session.placement_cache().expect("placing").is_rotating);
    }

    #[test]
    fn test_rotate_hold_snaps_continuous_rotation() {
        let mut h = Harness::new(10);
        let id = h.place("crate");
        h.input.set_pointer(PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(100.0, 0.0)));
        h.input.handle_key(KeyCode::KeyR, true);
        for _ in 0..20 {
            h.frame();
        }
        assert!(h.session.placement_cache().expect("placing").is_rotating);

        // 40 px * 0.1 * 20 deg = 80 deg, snapped to 15 deg steps -> 75
        h.input.set_pointer(PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(140.0, 0.0)));
        h.frame();
        let offset = h.scene.get(id).expect("placing").rotation.offset;
        assert!(offset.dot(Quat::from_rotation_y(75f32.to_radians())).abs() > 1.0 - 1e-6);

        // Releasing after a continuous rotation does not add a tap
        h.input.handle_key(KeyCode::KeyR, false);
        h.frame();
        let offset = h.scene.get(id).expect("placing").rotation.offset;
        assert!(offset.dot(Quat::from_rotation_y(75f32.to_radians())).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn test_stacking_from_toolbar() {
        let mut h = Harness::new(10);
        let below = h.scene.spawn_piece("crate").expect("known piece");
        h.scene.set_status(below, PlacementStatus::Placed);

        let id = h.place("crate");
        h.toolbar
            .queue(PanelKind::Placement, ToolbarAction::SetStacking(StackMode::Boundary));
        h.toolbar.queue(PanelKind::Placement, ToolbarAction::SetSnap(SnapPolicy::FreeForm));
        h.input.set_pointer(PointerSample::at(Vec3::ZERO));
        h.frame();

        assert_eq!(h.scene.world_position(id).map(|p| p.y), Some(1.0));
        assert_eq!(h.session.placement_cache().expect("placing").last_y_stack, 1.0);
    }

    #[test]
    fn test_vertical_fast_place_keeps_offset() {
        let mut h = Harness::new(10);
        let id = h.place("crate");
        h.toolbar.queue(PanelKind::Placement, ToolbarAction::SetSnap(SnapPolicy::FreeForm));
        h.input.set_pointer(PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(0.0, 100.0)));
        h.frame();

        h.input.handle_key(KeyCode::ShiftLeft, true);
        h.frame();
        // Pointer moved 20 px up the screen
        h.input.set_pointer(PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(0.0, 80.0)));
        h.frame();
        assert_eq!(h.scene.world_position(id).map(|p| p.y), Some(2.0));

        h.input.handle_key(KeyCode::ShiftLeft, false);
        h.frame();
        let cache = h.session.placement_cache().expect("placing");
        assert_eq!(cache.fast_place_offset, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(h.scene.world_position(id).map(|p| p.y), Some(2.0));
    }

    #[test]
    fn test_interrupt_keeps_cache_for_next_placement() {
        let mut h = Harness::new(10);
        let first = h.place("crate");
        h.toolbar.queue(PanelKind::Placement, ToolbarAction::SetSnap(SnapPolicy::Edge));
        h.frame();

        h.session.cancel(&mut h.scene, &h.config);
        assert!(!h.scene.contains(first));
        assert!(h.session.is_suspended(StateKind::PlaceObject));
        assert!(!h.toolbar.is_open(PanelKind::Placement));

        h.place("crate");
        assert_eq!(h.session.placement_cache().expect("placing").snap, SnapPolicy::Edge);
        assert!(!h.session.is_suspended(StateKind::PlaceObject));
    }

    #[test]
    fn test_resume_keeps_rotation_in_progress() {
        let mut h = Harness::new(10);
        h.place("crate");
        h.input.set_pointer(PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(100.0, 0.0)));
        h.input.handle_key(KeyCode::KeyR, true);
        for _ in 0..20 {
            h.frame();
        }
        let before = h.session.placement_cache().expect("placing").clone();
        assert!(before.is_rotating);
        assert!(before.rotate_held.is_some());

        h.session.cancel(&mut h.scene, &h.config);
        assert!(h.session.is_suspended(StateKind::PlaceObject));
        h.place("crate");

        let after = h.session.placement_cache().expect("placing");
        assert!(after.is_rotating);
        assert_eq!(after.rotate_held, before.rotate_held);
        assert_eq!(after.start_rotation, before.start_rotation);
        assert_eq!(after.snap_rotation, before.snap_rotation);
        assert_eq!(after.last_screen_x, before.last_screen_x);
    }

    #[test]
    fn test_resume_keeps_fast_placement_in_progress() {
        let mut h = Harness::new(10);
        h.place("crate");
        h.input.set_pointer(PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(0.0, 100.0)));
        h.frame();
        h.input.handle_key(KeyCode::ShiftLeft, true);
        h.frame();
        let before = h.session.placement_cache().expect("placing").clone();
        assert!(before.is_fast_placing);

        h.session.cancel(&mut h.scene, &h.config);
        h.place("crate");

        let after = h.session.placement_cache().expect("placing");
        assert!(after.is_fast_placing);
        assert_eq!(after.fast_place_set_offset, before.fast_place_set_offset);
        assert_eq!(after.fast_place_axis, before.fast_place_axis);
        assert_eq!(after.fast_place_start, before.fast_place_start);
        assert_eq!(after.fast_place_screen, before.fast_place_screen);
    }

    #[test]
    fn test_recolor_only_existing_slots() {
        let mut h = Harness::new(10);
        h.scene
            .catalog_mut()
            .insert(PieceDefinition::new("bench", EntityKind::Static, Vec3::ONE).with_colors(vec!["oak".to_string()]));
        let id = h.place("bench");
        h.toolbar.queue(
            PanelKind::Placement,
            ToolbarAction::Recolor {
                slot: 0,
                key: "birch".to_string(),
            },
        );
        h.toolbar.queue(
            PanelKind::Placement,
            ToolbarAction::Recolor {
                slot: 3,
                key: "pine".to_string(),
            },
        );
        h.frame();
        assert_eq!(h.scene.get(id).expect("placing").colors, vec!["birch".to_string()]);
        assert_eq!(h.session.placement_cache().expect("placing").colors, vec!["birch".to_string()]);
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let mut h = Harness::new(10);
        let result = h.session.request(
            &mut h.scene,
            &h.config,
            Transition::Place(PlacePayload::new(EntityId(999))),
        );
        assert!(matches!(result, Err(PlacementError::UnknownEntity(_))));
        assert_eq!(h.session.state(), StateKind::Spectate);
    }
}
