//! SelectObjects State
//!
//! Transform handles over one or more committed entities. A drag starts
//! when confirm is pressed over a handle and ends on release, registering
//! one undo step; confirming anywhere else ends the selection.

use glam::{Quat, Vec2, Vec3};
use log::{debug, info};

use crate::game::collab::{PanelKind, ToolbarAction, ToolbarHandle, ToolbarRequest};
use crate::game::entity::{EntityId, PlacementStatus};
use crate::game::error::{PlacementError, Result};
use crate::game::restriction::{RestrictionSet, RotationRestriction, SpaceRestriction};
use crate::game::scene::{LocalTransform, UndoRecord};
use crate::input::{HandleAxis, InputState, PlacementAction, PointerSample};
use crate::world::Frame;

use super::cache::{HandleKind, SelectCache};
use super::payload::{PlacePayload, SelectPayload, Transition};
use super::{Flow, SessionContext, SessionEvent};

/// A handle drag in progress.
#[derive(Debug, Clone)]
struct Drag {
    axis: HandleAxis,
    handle: HandleKind,
    start_pointer: Vec3,
    start_screen: Vec2,
    start_pivot: Frame,
    /// World frame and local transform of every entity when the drag began
    starts: Vec<(EntityId, Frame, LocalTransform)>,
}

pub(super) struct SelectObjects {
    entities: Vec<EntityId>,
    restrictions: RestrictionSet,
    pivot: Frame,
    cache: SelectCache,
    drag: Option<Drag>,
}

impl SelectObjects {
    pub(super) fn enter(
        ctx: &mut SessionContext<'_>,
        payload: SelectPayload,
        resume: Option<SelectCache>,
    ) -> Result<Self> {
        if payload.entities.is_empty() {
            return Err(PlacementError::Rejected("nothing selected".to_string()));
        }
        if let Some(missing) = payload.entities.iter().find(|id| !ctx.scene.contains(**id)) {
            return Err(PlacementError::UnknownEntity(*missing));
        }

        let mut state = Self {
            entities: payload.entities,
            restrictions: RestrictionSet::UNRESTRICTED,
            pivot: Frame::IDENTITY,
            cache: payload.cache.or(resume).unwrap_or_default(),
            drag: None,
        };
        state.refresh(ctx);
        if state.cache.toolbar.is_none() {
            state.cache.toolbar = Some(state.open_toolbar(ctx));
        }
        debug!("[SelectObjects] Selected {:?}", state.entities);
        Ok(state)
    }

    pub(super) fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub(super) fn cache(&self) -> &SelectCache {
        &self.cache
    }

    pub(super) fn update(&mut self, ctx: &mut SessionContext<'_>, input: &InputState, _dt: f32) -> Flow {
        self.entities.retain(|id| ctx.scene.contains(*id));
        if self.entities.is_empty() {
            debug!("[SelectObjects] Selection vanished");
            return Flow::Exit(None);
        }

        for action in ctx.services.ui.poll_actions(PanelKind::Selection) {
            if let Some(flow) = self.handle_action(ctx, action) {
                return flow;
            }
        }

        if input.action_just_pressed(PlacementAction::Delete) {
            return self.delete(ctx);
        }
        if input.action_just_pressed(PlacementAction::Cancel) {
            self.finish(ctx);
            return Flow::Exit(None);
        }

        if self.drag.is_some() {
            if input.action_pressed(PlacementAction::Confirm) {
                if let Some(pointer) = input.pointer() {
                    self.apply_drag(ctx, pointer);
                }
            } else {
                self.end_drag(ctx);
            }
        } else if input.action_just_pressed(PlacementAction::Confirm) {
            match (input.hovered_handle(), input.pointer()) {
                (Some(axis), Some(pointer)) => self.begin_drag(ctx, axis, pointer),
                (Some(_), None) => {}
                (None, _) => {
                    self.finish(ctx);
                    return Flow::Exit(None);
                }
            }
        }
        Flow::Continue
    }

    pub(super) fn interrupt(mut self, ctx: &mut SessionContext<'_>) -> SelectCache {
        self.finish(ctx);
        self.cache
    }

    /// Recompute the aggregate restrictions and the pivot.
    fn refresh(&mut self, ctx: &SessionContext<'_>) {
        let effective: Vec<RestrictionSet> = self
            .entities
            .iter()
            .map(|id| ctx.scene.effective_restrictions(*id))
            .collect();
        self.restrictions = RestrictionSet::aggregate(effective.iter());
        if self.restrictions.space != SpaceRestriction::None {
            self.cache.local_space = false;
        }
        if self.cache.handle == HandleKind::Scale && !self.restrictions.scalable {
            self.cache.handle = HandleKind::Move;
        }
        self.pivot = self.compute_pivot(ctx);
    }

    /// Average world position; the rotation follows a single entity.
    fn compute_pivot(&self, ctx: &SessionContext<'_>) -> Frame {
        let frames: Vec<Frame> = self.entities.iter().filter_map(|id| ctx.scene.world_frame(*id)).collect();
        if frames.is_empty() {
            return Frame::IDENTITY;
        }
        let center = frames.iter().map(|f| f.position).sum::<Vec3>() / frames.len() as f32;
        let rotation = match frames.as_slice() {
            [single] => single.rotation,
            _ => Quat::IDENTITY,
        };
        Frame::new(center, rotation, Vec3::ONE)
    }

    fn axis_world(&self, axis: HandleAxis, pivot: &Frame) -> Vec3 {
        if self.cache.local_space {
            (pivot.rotation * axis.vector()).normalize()
        } else {
            axis.vector()
        }
    }

    // ========================================================================
    // HANDLE DRAGS
    // ========================================================================

    fn begin_drag(&mut self, ctx: &SessionContext<'_>, axis: HandleAxis, pointer: &PointerSample) {
        let handle = self.cache.handle;
        if handle == HandleKind::Rotate
            && self.restrictions.rotation == RotationRestriction::YOnly
            && axis != HandleAxis::Y
        {
            debug!("[SelectObjects] Rotation about {:?} is restricted", axis);
            return;
        }
        if handle == HandleKind::Scale && !self.restrictions.scalable {
            return;
        }
        let starts = self
            .entities
            .iter()
            .filter_map(|id| Some((*id, ctx.scene.world_frame(*id)?, ctx.scene.capture_transform(*id)?)))
            .collect();
        self.drag = Some(Drag {
            axis,
            handle,
            start_pointer: pointer.position,
            start_screen: pointer.screen,
            start_pivot: self.pivot,
            starts,
        });
    }

    fn apply_drag(&mut self, ctx: &mut SessionContext<'_>, pointer: &PointerSample) {
        let Some(drag) = self.drag.as_ref() else {
            return;
        };
        let config = ctx.config;
        let pivot = drag.start_pivot;
        let axis = self.axis_world(drag.axis, &pivot);
        let mut planar = pointer.position - drag.start_pointer;
        planar.y = 0.0;
        let lift = (drag.start_screen.y - pointer.screen.y) * config.pointer_axis_scale;
        let along = planar.dot(axis) + lift * axis.y;

        match drag.handle {
            HandleKind::Move => {
                let mut along = along;
                if self.restrictions.is_grid_locked() {
                    let step = self
                        .entities
                        .iter()
                        .map(|id| ctx.scene.restricted_scale(*id))
                        .fold(0.0, f32::max);
                    if step > 0.0 {
                        along = (along / step).round() * step;
                    }
                }
                for (id, start, _) in &drag.starts {
                    ctx.scene.set_world_position(*id, start.position + axis * along);
                }
            }
            HandleKind::Rotate => {
                let mut degrees = (pointer.screen.x - drag.start_screen.x) * config.pointer_axis_scale * config.rotation_speed;
                let step = self.restrictions.rotation_step;
                if step > 0.0 {
                    degrees = (degrees / step).round() * step;
                }
                let turn = Quat::from_axis_angle(axis, degrees.to_radians());
                for (id, start, _) in &drag.starts {
                    let mut frame = *start;
                    frame.rotation = (turn * start.rotation).normalize();
                    if !self.cache.per_object {
                        frame.position = pivot.position + turn * (start.position - pivot.position);
                    }
                    ctx.scene.set_world_frame(*id, &frame);
                }
            }
            HandleKind::Scale => {
                let amount = along * config.selection_scale_speed;
                let index = match drag.axis {
                    HandleAxis::X => 0,
                    HandleAxis::Y => 1,
                    HandleAxis::Z => 2,
                };
                for (id, start, local) in &drag.starts {
                    if self.cache.per_object {
                        let mut scaled = *local;
                        scaled.scale[index] = (local.scale[index] + amount).max(config.minimum_scale);
                        ctx.scene.apply_transform(*id, &scaled);
                    } else {
                        // Uniform about the pivot; rotated members keep their own axes
                        let factor = (1.0 + amount).max(config.minimum_scale);
                        let mut frame = *start;
                        frame.scale = (start.scale * factor).max(Vec3::splat(config.minimum_scale));
                        frame.position = pivot.position + (start.position - pivot.position) * factor;
                        ctx.scene.set_world_frame(*id, &frame);
                    }
                }
            }
        }
    }

    fn end_drag(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let mut records = Vec::new();
        let mut parents = Vec::new();
        for (id, _, old) in drag.starts {
            let Some(new) = ctx.scene.capture_transform(id) else {
                continue;
            };
            if let Some(parent) = ctx.scene.get(id).and_then(|e| e.parent)
                && !parents.contains(&parent)
            {
                parents.push(parent);
            }
            if new != old {
                records.push(UndoRecord::Transformed { entity: id, old, new });
            }
        }
        for parent in parents {
            ctx.scene.recompute_bounds(parent, false);
        }
        match records.len() {
            0 => {}
            1 => ctx.services.undo.register(records.remove(0)),
            _ => ctx.services.undo.register(UndoRecord::Batch(records)),
        }
        self.reconcile_strokes(ctx);
        self.pivot = self.compute_pivot(ctx);
    }

    fn reconcile_strokes(&self, ctx: &mut SessionContext<'_>) {
        let strokes: Vec<EntityId> = self
            .entities
            .iter()
            .copied()
            .filter(|id| ctx.scene.get(*id).is_some_and(|e| e.is_stroke()))
            .collect();
        if !strokes.is_empty() {
            ctx.scene
                .reconcile_around(&strokes, ctx.services.spatial.as_ref(), ctx.config.connection_distance);
        }
    }

    fn finish(&mut self, ctx: &mut SessionContext<'_>) {
        self.end_drag(ctx);
    }

    // ========================================================================
    // TOOLBAR
    // ========================================================================

    fn handle_action(&mut self, ctx: &mut SessionContext<'_>, action: ToolbarAction) -> Option<Flow> {
        match action {
            ToolbarAction::Move => self.cache.handle = HandleKind::Move,
            ToolbarAction::Rotate => self.cache.handle = HandleKind::Rotate,
            ToolbarAction::Scale if self.restrictions.scalable => self.cache.handle = HandleKind::Scale,
            ToolbarAction::ToggleLocalSpace if self.restrictions.space == SpaceRestriction::None => {
                self.cache.local_space = !self.cache.local_space
            }
            ToolbarAction::TogglePerObject => self.cache.per_object = !self.cache.per_object,
            ToolbarAction::Duplicate => return self.duplicate(ctx),
            ToolbarAction::Delete => return Some(self.delete(ctx)),
            ToolbarAction::Edit => return self.edit(ctx),
            ToolbarAction::Replace { piece } => return self.replace(ctx, &piece),
            ToolbarAction::Recolor { slot, key } => {
                for id in &self.entities {
                    if let Some(entity) = ctx.scene.get_mut(*id)
                        && slot < entity.colors.len()
                    {
                        entity.colors[slot] = key.clone();
                    }
                }
            }
            ToolbarAction::Rescale { scale } if self.restrictions.scalable => self.rescale(ctx, scale),
            ToolbarAction::ContentChanged => self.refresh(ctx),
            other => debug!("[SelectObjects] Ignoring {:?}", other),
        }
        None
    }

    /// Clone the selection into the same sets and select the clones.
    fn duplicate(&mut self, ctx: &mut SessionContext<'_>) -> Option<Flow> {
        self.finish(ctx);
        let cost: i64 = self.entities.iter().map(|id| ctx.cost_of(*id)).sum();
        if let Err(err) = ctx.check_funds(cost).and_then(|_| ctx.services.economy.debit(cost)) {
            ctx.report(&err);
            return None;
        }

        let mut clones = Vec::with_capacity(self.entities.len());
        for id in &self.entities {
            let Some(clone) = ctx.scene.duplicate(*id) else {
                continue;
            };
            if let Some(parent) = ctx.scene.get(*id).and_then(|e| e.parent) {
                ctx.scene.add_member(parent, clone);
            } else {
                ctx.scene.set_status(clone, PlacementStatus::Placed);
            }
            ctx.emit(SessionEvent::Placed(clone));
            clones.push(clone);
        }
        ctx.services.undo.register(UndoRecord::Batch(
            clones.iter().map(|c| UndoRecord::Placed { entity: *c }).collect(),
        ));
        info!("[SelectObjects] Duplicated {:?} into {:?}", self.entities, clones);

        let mut cache = self.cache.clone();
        cache.toolbar = None;
        Some(Flow::Exit(Some(Transition::Select(SelectPayload::new(clones).with_cache(cache)))))
    }

    fn delete(&mut self, ctx: &mut SessionContext<'_>) -> Flow {
        self.drag = None;
        ctx.services.undo.clear_for(&self.entities);
        for id in &self.entities {
            ctx.scene.destroy(*id);
            ctx.emit(SessionEvent::Deleted(*id));
        }
        info!("[SelectObjects] Deleted {:?}", self.entities);
        Flow::Exit(None)
    }

    fn edit(&mut self, ctx: &mut SessionContext<'_>) -> Option<Flow> {
        match self.entities.as_slice() {
            [set] if ctx.scene.get(*set).is_some_and(|e| e.is_set()) => {
                let set = *set;
                self.finish(ctx);
                ctx.emit(SessionEvent::EditRequested(set));
                Some(Flow::Exit(None))
            }
            _ => {
                debug!("[SelectObjects] Edit needs a single set");
                None
            }
        }
    }

    fn replace(&mut self, ctx: &mut SessionContext<'_>, piece: &str) -> Option<Flow> {
        let [target] = self.entities.as_slice() else {
            ctx.report(&PlacementError::Rejected("replace needs a single selection".to_string()));
            return None;
        };
        let target = *target;
        self.finish(ctx);
        match PlacePayload::replacing(ctx.scene, target, piece) {
            Ok(payload) => Some(Flow::Exit(Some(Transition::Place(payload)))),
            Err(err) => {
                ctx.report(&err);
                None
            }
        }
    }

    fn rescale(&mut self, ctx: &mut SessionContext<'_>, scale: Vec3) {
        let scale = scale.max(Vec3::splat(ctx.config.minimum_scale));
        let mut records = Vec::new();
        for id in &self.entities {
            let Some(old) = ctx.scene.capture_transform(*id) else {
                continue;
            };
            let new = LocalTransform { scale, ..old };
            ctx.scene.apply_transform(*id, &new);
            records.push(UndoRecord::Transformed { entity: *id, old, new });
        }
        if !records.is_empty() {
            ctx.services.undo.register(UndoRecord::Batch(records));
        }
    }

    fn open_toolbar(&self, ctx: &mut SessionContext<'_>) -> ToolbarHandle {
        let mut actions = vec![ToolbarAction::Move, ToolbarAction::Rotate];
        if self.restrictions.scalable {
            actions.push(ToolbarAction::Scale);
        }
        actions.extend([ToolbarAction::Duplicate, ToolbarAction::Delete]);
        if let [single] = self.entities.as_slice()
            && ctx.scene.get(*single).is_some_and(|e| e.is_set())
        {
            actions.push(ToolbarAction::Edit);
        }
        if self.restrictions.space == SpaceRestriction::None {
            actions.push(ToolbarAction::ToggleLocalSpace);
        }
        if self.entities.len() > 1 {
            actions.push(ToolbarAction::TogglePerObject);
        }
        ctx.services.ui.open(ToolbarRequest {
            panel: PanelKind::Selection,
            entities: self.entities.clone(),
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::game::catalog::{PieceCatalog, PieceDefinition};
    use crate::game::collab::{Collaborators, RecordingToolbar};
    use crate::game::config::PlacementConfig;
    use crate::game::entity::EntityKind;
    use crate::game::scene::Scene;
    use crate::game::session::{PlacementSession, StateKind};
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
        fn new() -> Self {
            let toolbar = RecordingToolbar::new();
            let services = Collaborators::in_memory(10).with_ui(Box::new(toolbar.clone()));
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

        fn committed(&mut self, piece: &str, at: Vec3) -> EntityId {
            let id = self.scene.spawn_piece(piece).expect("known piece");
            self.scene.set_world_position(id, at);
            self.scene.set_status(id, PlacementStatus::Placed);
            id
        }

        fn select(&mut self, entities: Vec<EntityId>) {
            self.session
                .request(&mut self.scene, &self.config, Transition::Select(SelectPayload::new(entities)))
                .expect("spectate can select");
        }

        fn frame(&mut self) {
            self.session.update(&mut self.scene, &self.config, &self.input, 1.0 / 60.0);
            self.input.end_frame();
        }

        /// Press on `axis` at `from`, drag to `to`, release.
        fn drag(&mut self, axis: HandleAxis, from: PointerSample, to: PointerSample) {
            self.input.set_hovered_handle(Some(axis));
            self.input.set_pointer(from);
            self.input.handle_key(KeyCode::MouseLeft, true);
            self.frame();
            self.input.set_pointer(to);
            self.frame();
            self.input.handle_key(KeyCode::MouseLeft, false);
            self.frame();
            self.input.set_hovered_handle(None);
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_move_drag_along_axis() {
        let mut h = Harness::new();
        let id = h.committed("crate", Vec3::ZERO);
        h.select(vec![id]);
        h.drag(
            HandleAxis::X,
            PointerSample::at(Vec3::ZERO),
            PointerSample::at(Vec3::new(2.4, 0.0, 1.0)),
        );

        let position = h.scene.world_position(id).expect("exists");
        assert!(approx(position, Vec3::new(2.4, 0.0, 0.0)));
        assert_eq!(h.session.services().undo.len(), 1);
        assert_eq!(h.session.state(), StateKind::SelectObjects);

        // Clicking away from the handles ends the selection
        h.input.handle_key(KeyCode::MouseLeft, true);
        h.frame();
        assert_eq!(h.session.state(), StateKind::Spectate);
        assert!(!h.toolbar.is_open(PanelKind::Selection));
    }

    #[test]
    fn test_grid_locked_move_keeps_cell() {
        let mut h = Harness::new();
        let id = h.committed("foundation", Vec3::new(1.0, 0.0, 1.0));
        h.select(vec![id]);
        h.drag(
            HandleAxis::X,
            PointerSample::at(Vec3::ZERO),
            PointerSample::at(Vec3::new(2.4, 0.0, 0.0)),
        );
        let position = h.scene.world_position(id).expect("exists");
        assert!(approx(position, Vec3::new(3.0, 0.0, 1.0)));
    }

    #[test]
    fn test_vertical_move_uses_screen_lift() {
        let mut h = Harness::new();
        let id = h.committed("crate", Vec3::ZERO);
        h.select(vec![id]);
        h.drag(
            HandleAxis::Y,
            PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(0.0, 100.0)),
            PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(0.0, 70.0)),
        );
        let position = h.scene.world_position(id).expect("exists");
        assert!(approx(position, Vec3::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_group_rotation_turns_about_pivot() {
        let mut h = Harness::new();
        let a = h.committed("crate", Vec3::new(-1.0, 0.0, 0.0));
        let b = h.committed("crate", Vec3::new(1.0, 0.0, 0.0));
        h.select(vec![a, b]);
        h.toolbar.queue(PanelKind::Selection, ToolbarAction::Rotate);
        h.frame();
        // 45 px * 0.1 * 20 deg = 90 deg
        h.drag(
            HandleAxis::Y,
            PointerSample::at(Vec3::ZERO),
            PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(45.0, 0.0)),
        );

        assert!(approx(h.scene.world_position(a).expect("exists"), Vec3::new(0.0, 0.0, 1.0)));
        assert!(approx(h.scene.world_position(b).expect("exists"), Vec3::new(0.0, 0.0, -1.0)));
        // Both moved in one undo step
        assert_eq!(h.session.services().undo.len(), 1);
    }

    #[test]
    fn test_yaw_only_selection_ignores_other_rotation_axes() {
        let mut h = Harness::new();
        let id = h.committed("foundation", Vec3::new(1.0, 0.0, 1.0));
        h.select(vec![id]);
        h.toolbar.queue(PanelKind::Selection, ToolbarAction::Rotate);
        h.frame();
        h.drag(
            HandleAxis::X,
            PointerSample::at(Vec3::ZERO),
            PointerSample::at(Vec3::ZERO).with_screen(Vec2::new(45.0, 0.0)),
        );
        let rotation = h.scene.world_frame(id).expect("exists").rotation;
        assert!(rotation.dot(Quat::IDENTITY).abs() > 1.0 - 1e-6);
        assert_eq!(h.session.services().undo.len(), 0);
    }

    #[test]
    fn test_delete_key_destroys_selection() {
        let mut h = Harness::new();
        let a = h.committed("crate", Vec3::ZERO);
        let b = h.committed("crate", Vec3::new(3.0, 0.0, 0.0));
        h.select(vec![a, b]);
        h.input.handle_key(KeyCode::Delete, true);
        h.frame();

        assert!(!h.scene.contains(a) && !h.scene.contains(b));
        assert_eq!(h.session.state(), StateKind::Spectate);
        let events = h.session.drain_events();
        assert!(events.contains(&SessionEvent::Deleted(a)));
        assert!(events.contains(&SessionEvent::Deleted(b)));
    }

    #[test]
    fn test_duplicate_debits_and_selects_clones() {
        let mut h = Harness::new();
        let set = h.scene.create_set("yard");
        let id = h.committed("crate", Vec3::ZERO);
        h.scene.add_member(set, id);
        h.select(vec![id]);
        h.toolbar.queue(PanelKind::Selection, ToolbarAction::Duplicate);
        h.frame();

        assert_eq!(h.session.state(), StateKind::SelectObjects);
        let clone = h.session.selection()[0];
        assert_ne!(clone, id);
        assert!(h.scene.is_member(set, clone));
        assert_eq!(h.session.services().economy.balance(), 5);
        assert!(h.toolbar.is_open(PanelKind::Selection));
        assert_eq!(h.toolbar.open_requests()[0].entities, vec![clone]);
    }

    #[test]
    fn test_duplicate_refused_without_funds() {
        let mut h = Harness::new();
        let a = h.committed("crate", Vec3::ZERO);
        let b = h.committed("crate", Vec3::new(2.0, 0.0, 0.0));
        let c = h.committed("crate", Vec3::new(4.0, 0.0, 0.0));
        h.select(vec![a, b, c]);
        h.toolbar.queue(PanelKind::Selection, ToolbarAction::Duplicate);
        h.frame();

        assert_eq!(h.session.selection(), &[a, b, c]);
        assert_eq!(h.scene.len(), 3);
        assert_eq!(h.toolbar.messages(), vec![h.config.insufficient_funds_message.clone()]);
    }

    #[test]
    fn test_replace_switches_to_placement() {
        let mut h = Harness::new();
        let id = h.committed("crate", Vec3::new(2.0, 0.0, 0.0));
        h.select(vec![id]);
        h.toolbar.queue(
            PanelKind::Selection,
            ToolbarAction::Replace {
                piece: "foundation".to_string(),
            },
        );
        h.frame();

        assert_eq!(h.session.state(), StateKind::PlaceObject);
        let placing = h.session.placing().expect("placing the replacement");
        assert_eq!(h.scene.get(placing).and_then(|e| e.piece_id.clone()), Some("foundation".to_string()));
        assert!(!h.scene.get(id).expect("hidden").active);
        assert!(!h.toolbar.is_open(PanelKind::Selection));
        assert!(h.toolbar.is_open(PanelKind::Placement));
    }

    #[test]
    fn test_edit_requested_for_single_set() {
        let mut h = Harness::new();
        let set = h.scene.create_set("yard");
        let id = h.committed("crate", Vec3::ZERO);
        h.scene.add_member(set, id);
        h.select(vec![set]);
        assert!(h.toolbar.open_requests()[0].actions.contains(&ToolbarAction::Edit));

        h.toolbar.queue(PanelKind::Selection, ToolbarAction::Edit);
        h.frame();
        assert_eq!(h.session.state(), StateKind::Spectate);
        assert!(h.session.drain_events().contains(&SessionEvent::EditRequested(set)));
    }

    #[test]
    fn test_world_only_selection_forces_world_handles() {
        let mut h = Harness::new();
        let id = h.committed("foundation", Vec3::new(1.0, 0.0, 1.0));
        let cache = SelectCache {
            local_space: true,
            ..SelectCache::default()
        };
        h.session
            .request(
                &mut h.scene,
                &h.config,
                Transition::Select(SelectPayload::new(vec![id]).with_cache(cache)),
            )
            .expect("spectate can select");
        assert!(!h.session.select_cache().expect("selecting").local_space);
        assert!(!h.toolbar.open_requests()[0].actions.contains(&ToolbarAction::ToggleLocalSpace));
        assert!(!h.toolbar.open_requests()[0].actions.contains(&ToolbarAction::Scale));
    }

    #[test]
    fn test_empty_selection_rejected() {
        let mut h = Harness::new();
        let result = h
            .session
            .request(&mut h.scene, &h.config, Transition::Select(SelectPayload::default()));
        assert!(matches!(result, Err(PlacementError::Rejected(_))));
    }
}
