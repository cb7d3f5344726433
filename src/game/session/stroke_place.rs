//! StrokePlace State
//!
//! Connector pieces drawn as a drag: the first confirm fixes the start,
//! the second commits every placeable point between start and pointer.
//! Existing connectors under the drag are replaced, and every committed
//! piece is reconciled with its neighbours.

use glam::{Quat, Vec3};
use log::{debug, info, warn};

use crate::game::collab::{PanelKind, ToolbarAction, ToolbarHandle, ToolbarRequest};
use crate::game::entity::{EntityId, PlacementStatus};
use crate::game::error::{PlacementError, Result};
use crate::game::scene::{Scene, UndoRecord};
use crate::game::snap::{SnapFrame, SnapPolicy, snap_position};
use crate::game::stroke::{StrokeCategory, StrokeContext, StrokePlan, StrokeType, plan_stroke};
use crate::input::{InputState, PlacementAction};

use super::cache::{StrokeCache, StrokePhase};
use super::payload::{StrokeAdmissionFn, StrokePayload, StrokePointFn};
use super::{Flow, SessionContext, SessionEvent};

/// Archetypes consulted, in order, for the spacing of a category.
const SIZING_ORDER: [StrokeType; 5] = [
    StrokeType::Straight,
    StrokeType::End,
    StrokeType::Turn,
    StrokeType::ThreeWay,
    StrokeType::Cross,
];

pub(super) struct StrokePlace {
    category: StrokeCategory,
    spacing: f32,
    min_scale: f32,
    cache: StrokeCache,
    preview: Option<StrokePlan>,
    admission: Option<StrokeAdmissionFn>,
    on_point_placed: Option<StrokePointFn>,
    on_point_deleted: Option<StrokePointFn>,
}

/// Sample spacing and footprint of a category, from its first registered
/// archetype at unit scale.
fn category_metrics(scene: &Scene, category: StrokeCategory) -> Result<(f32, f32)> {
    SIZING_ORDER
        .iter()
        .find_map(|archetype| scene.catalog().archetype(category, *archetype))
        .map(|piece| {
            let metrics = piece.metrics(Vec3::ONE);
            (metrics.scale, metrics.min_scale)
        })
        .ok_or(PlacementError::MissingArchetype {
            category,
            archetype: StrokeType::Straight,
        })
}

impl StrokePlace {
    pub(super) fn enter(
        ctx: &mut SessionContext<'_>,
        payload: StrokePayload,
        resume: Option<StrokeCache>,
    ) -> Result<Self> {
        let (spacing, min_scale) = category_metrics(ctx.scene, payload.category)?;
        let mut cache = payload.cache.or(resume).unwrap_or_default();
        if cache.toolbar.is_none() {
            cache.toolbar = Some(open_toolbar(ctx));
        }
        debug!(
            "[StrokePlace] Drawing {:?} (spacing {}, footprint {})",
            payload.category, spacing, min_scale
        );
        Ok(Self {
            category: payload.category,
            spacing,
            min_scale,
            cache,
            preview: None,
            admission: payload.admission,
            on_point_placed: payload.on_point_placed,
            on_point_deleted: payload.on_point_deleted,
        })
    }

    pub(super) fn cache(&self) -> &StrokeCache {
        &self.cache
    }

    pub(super) fn preview(&self) -> Option<&StrokePlan> {
        self.preview.as_ref()
    }

    pub(super) fn update(&mut self, ctx: &mut SessionContext<'_>, input: &InputState, _dt: f32) -> Flow {
        let pointer = input.pointer().map(|p| self.snap(p.position));

        for action in ctx.services.ui.poll_actions(PanelKind::Stroke) {
            match action {
                ToolbarAction::Confirm => self.confirm(ctx, pointer),
                ToolbarAction::Cancel => {
                    if let Flow::Exit(next) = self.cancel(ctx) {
                        return Flow::Exit(next);
                    }
                }
                other => debug!("[StrokePlace] Ignoring {:?}", other),
            }
        }

        if let Some(end) = pointer {
            self.preview = Some(self.plan(ctx, end));
        }

        if input.action_just_pressed(PlacementAction::Cancel) {
            return self.cancel(ctx);
        }
        if input.action_just_pressed(PlacementAction::Confirm) {
            self.confirm(ctx, pointer);
        }
        Flow::Continue
    }

    pub(super) fn interrupt(mut self, ctx: &mut SessionContext<'_>) -> StrokeCache {
        self.finish(ctx);
        self.cache
    }

    /// Pointer on the connector lattice.
    fn snap(&self, position: Vec3) -> Vec3 {
        snap_position(position, SnapPolicy::Center, &SnapFrame::world(self.spacing))
    }

    fn plan(&self, ctx: &SessionContext<'_>, end: Vec3) -> StrokePlan {
        let start = match self.cache.phase {
            StrokePhase::Aiming => end,
            StrokePhase::Drawing { start } => start,
        };
        let stroke = StrokeContext {
            scene: &*ctx.scene,
            spatial: ctx.services.spatial.as_ref(),
            terrain: Some(ctx.services.terrain.as_ref()),
            category: self.category,
            spacing: self.spacing,
            min_scale: self.min_scale,
            probe_height: ctx.config.stroke_probe_height,
            max_slope: ctx.config.stroke_max_slope,
        };
        plan_stroke(&stroke, start, end)
    }

    fn confirm(&mut self, ctx: &mut SessionContext<'_>, pointer: Option<Vec3>) {
        match self.cache.phase {
            StrokePhase::Aiming => {
                let Some(start) = pointer else {
                    return;
                };
                self.cache.phase = StrokePhase::Drawing { start };
                self.preview = Some(self.plan(ctx, start));
                debug!("[StrokePlace] Stroke starts at {}", start);
            }
            StrokePhase::Drawing { .. } => {
                self.commit(ctx);
                self.cache.phase = StrokePhase::Aiming;
            }
        }
    }

    /// Drawing goes back to aiming; aiming leaves the state.
    fn cancel(&mut self, ctx: &mut SessionContext<'_>) -> Flow {
        match self.cache.phase {
            StrokePhase::Drawing { .. } => {
                self.cache.phase = StrokePhase::Aiming;
                Flow::Continue
            }
            StrokePhase::Aiming => {
                self.finish(ctx);
                Flow::Exit(None)
            }
        }
    }

    fn commit(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(plan) = self.preview.take() else {
            return;
        };
        let count = plan.placement_count();
        if count == 0 {
            debug!("[StrokePlace] Nothing placeable in stroke");
            return;
        }

        let pieces: Vec<(Vec3, Quat, String)> = plan
            .points
            .iter()
            .filter(|p| p.will_place())
            .filter_map(|p| {
                let piece = ctx.scene.catalog().archetype(self.category, p.archetype?)?;
                Some((p.position, p.rotation(), piece.id.clone()))
            })
            .collect();
        let cost: i64 = pieces
            .iter()
            .filter_map(|(_, _, id)| ctx.scene.catalog().get(id))
            .map(|piece| piece.price)
            .sum();

        let admitted = match self.admission.as_mut() {
            Some(admission) => admission(ctx, count),
            None => ctx.check_funds(cost),
        };
        if let Err(err) = admitted.and_then(|_| ctx.services.economy.debit(cost)) {
            ctx.report(&err);
            return;
        }

        let deletions = plan.deletions();
        ctx.services.undo.clear_for(&deletions);
        for id in deletions {
            if let Some(parent) = ctx.scene.get(id).and_then(|e| e.parent)
                && !self.cache.touched_sets.contains(&parent)
            {
                self.cache.touched_sets.push(parent);
            }
            ctx.scene.destroy(id);
            ctx.emit(SessionEvent::Deleted(id));
            if let Some(callback) = self.on_point_deleted.as_mut() {
                callback(ctx, id);
            }
        }

        let mut placed = Vec::with_capacity(pieces.len());
        for (position, rotation, piece) in pieces {
            let id = match ctx.scene.spawn_piece(&piece) {
                Ok(id) => id,
                Err(err) => {
                    warn!("[StrokePlace] {}", err);
                    continue;
                }
            };
            ctx.scene.set_world_position(id, position);
            ctx.scene.set_world_rotation(id, rotation);
            ctx.scene.set_status(id, PlacementStatus::Placed);
            ctx.emit(SessionEvent::Placed(id));
            if let Some(callback) = self.on_point_placed.as_mut() {
                callback(ctx, id);
            }
            placed.push(id);
        }

        ctx.services.undo.register(UndoRecord::Batch(
            placed.iter().map(|id| UndoRecord::Placed { entity: *id }).collect(),
        ));
        ctx.scene
            .reconcile_around(&placed, ctx.services.spatial.as_ref(), ctx.config.connection_distance);
        info!("[StrokePlace] Committed {} {:?} connectors", placed.len(), self.category);
    }

    /// Close sets that lost connectors to this stroke.
    fn finish(&mut self, ctx: &mut SessionContext<'_>) {
        for set in self.cache.touched_sets.drain(..) {
            if ctx.scene.group(set).is_some() {
                ctx.scene.finalize(set);
            }
        }
    }
}

fn open_toolbar(ctx: &mut SessionContext<'_>) -> ToolbarHandle {
    ctx.services.ui.open(ToolbarRequest {
        panel: PanelKind::Stroke,
        entities: Vec::<EntityId>::new(),
        actions: vec![ToolbarAction::Confirm, ToolbarAction::Cancel],
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::game::catalog::{PieceCatalog, PieceDefinition};
    use crate::game::collab::{Collaborators, RecordingToolbar};
    use crate::game::config::PlacementConfig;
    use crate::game::entity::EntityKind;
    use crate::game::session::{PlacementSession, StateKind, Transition};
    use crate::game::stroke::ConnectionDirection::*;
    use crate::input::{KeyCode, PointerSample};

    use super::*;

    fn catalog() -> PieceCatalog {
        let size = Vec3::new(1.0, 0.1, 1.0);
        let connector = |id: &str, archetype, dirs| {
            PieceDefinition::connector(id, StrokeCategory::Path, archetype, dirs, size).with_price(2)
        };
        PieceCatalog::new()
            .with(connector("end", StrokeType::End, vec![Front]))
            .with(connector("turn", StrokeType::Turn, vec![Front, Right]))
            .with(connector("straight", StrokeType::Straight, vec![Front, Back]))
            .with(connector("three_way", StrokeType::ThreeWay, vec![Front, Back, Right]))
            .with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE))
    }

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
            Self {
                scene: Scene::new(catalog()),
                session: PlacementSession::new(services),
                config: PlacementConfig::default(),
                toolbar,
                input: InputState::new(),
            }
        }

        fn start(&mut self, payload: StrokePayload) {
            self.session
                .request(&mut self.scene, &self.config, Transition::Stroke(payload))
                .expect("spectate can stroke");
        }

        fn frame(&mut self) {
            self.session.update(&mut self.scene, &self.config, &self.input, 1.0 / 60.0);
            self.input.end_frame();
        }

        fn click_at(&mut self, at: Vec3) {
            self.input.set_pointer(PointerSample::at(at));
            self.input.handle_key(KeyCode::MouseLeft, true);
            self.frame();
            self.input.handle_key(KeyCode::MouseLeft, false);
            self.frame();
        }

        fn connectors(&self) -> Vec<String> {
            let mut ids: Vec<String> = self
                .scene
                .iter()
                .filter(|e| e.is_stroke())
                .filter_map(|e| e.piece_id.clone())
                .collect();
            ids.sort();
            ids
        }
    }

    #[test]
    fn test_click_drag_click_commits_run() {
        let mut h = Harness::new(10);
        h.start(StrokePayload::new(StrokeCategory::Path));
        assert!(h.toolbar.is_open(PanelKind::Stroke));

        h.click_at(Vec3::new(0.2, 0.0, 0.2));
        assert_eq!(
            h.session.stroke_cache().map(|c| c.phase),
            Some(StrokePhase::Drawing {
                start: Vec3::new(0.5, 0.0, 0.5)
            })
        );

        h.input.set_pointer(PointerSample::at(Vec3::new(0.4, 0.0, 2.4)));
        h.frame();
        assert_eq!(h.session.stroke_preview().map(|p| p.placement_count()), Some(3));

        h.click_at(Vec3::new(0.4, 0.0, 2.4));
        assert_eq!(h.connectors(), vec!["end", "end", "straight"]);
        assert_eq!(h.session.services().economy.balance(), 4);
        assert_eq!(h.session.services().undo.len(), 1);
        assert_eq!(h.session.stroke_cache().map(|c| c.phase), Some(StrokePhase::Aiming));
        assert_eq!(h.session.state(), StateKind::StrokePlace);
    }

    #[test]
    fn test_committed_run_is_connected() {
        let mut h = Harness::new(10);
        h.start(StrokePayload::new(StrokeCategory::Path));
        h.click_at(Vec3::new(0.5, 0.0, 0.5));
        h.click_at(Vec3::new(0.5, 0.0, 2.5));

        let middle = h
            .scene
            .iter()
            .find(|e| e.piece_id.as_deref() == Some("straight"))
            .map(|e| e.id)
            .expect("middle connector placed");
        assert_eq!(h.scene.connections(middle).len(), 2);
    }

    #[test]
    fn test_isolated_click_places_an_end() {
        let mut h = Harness::new(10);
        h.start(StrokePayload::new(StrokeCategory::Path));
        h.click_at(Vec3::new(4.5, 0.0, 4.5));
        h.click_at(Vec3::new(4.5, 0.0, 4.5));

        assert_eq!(h.connectors(), vec!["end"]);
        assert_eq!(h.session.services().economy.balance(), 8);
    }

    #[test]
    fn test_cancel_steps_back_then_exits() {
        let mut h = Harness::new(10);
        h.start(StrokePayload::new(StrokeCategory::Path));
        h.click_at(Vec3::ZERO);

        h.input.handle_key(KeyCode::Escape, true);
        h.frame();
        assert_eq!(h.session.stroke_cache().map(|c| c.phase), Some(StrokePhase::Aiming));
        h.input.handle_key(KeyCode::Escape, false);
        h.frame();

        h.input.handle_key(KeyCode::Escape, true);
        h.frame();
        assert_eq!(h.session.state(), StateKind::Spectate);
        assert!(!h.toolbar.is_open(PanelKind::Stroke));
        assert!(h.connectors().is_empty());
    }

    #[test]
    fn test_insufficient_funds_blocks_commit() {
        let mut h = Harness::new(3);
        h.start(StrokePayload::new(StrokeCategory::Path));
        h.click_at(Vec3::new(0.5, 0.0, 0.5));
        h.click_at(Vec3::new(0.5, 0.0, 2.5));

        assert!(h.connectors().is_empty());
        assert_eq!(h.session.services().economy.balance(), 3);
        assert_eq!(h.toolbar.messages(), vec![h.config.insufficient_funds_message.clone()]);
    }

    #[test]
    fn test_redraw_replaces_existing_connector() {
        let mut h = Harness::new(10);
        let set = h.scene.create_set("garden");
        let crate_id = h.scene.spawn_piece("crate").expect("known piece");
        h.scene.set_world_position(crate_id, Vec3::new(5.0, 0.0, 5.0));
        h.scene.add_member(set, crate_id);
        let old = h.scene.spawn_piece("end").expect("known piece");
        h.scene.set_world_position(old, Vec3::new(0.5, 0.0, 0.5));
        h.scene.add_member(set, old);
        h.scene.set_status(set, PlacementStatus::Placed);

        h.start(StrokePayload::new(StrokeCategory::Path));
        h.click_at(Vec3::new(0.5, 0.0, 0.5));
        h.click_at(Vec3::new(0.5, 0.0, 0.5));

        assert!(!h.scene.contains(old));
        assert_eq!(h.connectors(), vec!["end"]);
        assert!(h.session.drain_events().contains(&SessionEvent::Deleted(old)));
        assert_eq!(h.session.stroke_cache().map(|c| c.touched_sets.clone()), Some(vec![set]));

        h.session.cancel(&mut h.scene, &h.config);
        assert!(h.scene.group(set).is_some_and(|g| g.members == vec![crate_id]));
    }

    #[test]
    fn test_custom_admission_sees_point_count() {
        let mut h = Harness::new(100);
        let seen = Rc::new(Cell::new(0));
        let placed = Rc::new(Cell::new(0));
        let (seen_in, placed_in) = (seen.clone(), placed.clone());
        h.start(
            StrokePayload::new(StrokeCategory::Path)
                .with_admission(Box::new(move |_, count| {
                    seen_in.set(count);
                    Ok(())
                }))
                .on_point_placed(Box::new(move |_, _| placed_in.set(placed_in.get() + 1))),
        );
        h.click_at(Vec3::new(0.5, 0.0, 0.5));
        h.click_at(Vec3::new(3.5, 0.0, 0.5));

        assert_eq!(seen.get(), 4);
        assert_eq!(placed.get(), 4);
        assert_eq!(h.session.services().economy.balance(), 92);
    }

    #[test]
    fn test_category_without_pieces_is_rejected() {
        let mut h = Harness::new(10);
        let result = h.session.request(
            &mut h.scene,
            &h.config,
            Transition::Stroke(StrokePayload::new(StrokeCategory::Fence)),
        );
        assert!(matches!(
            result,
            Err(PlacementError::MissingArchetype {
                category: StrokeCategory::Fence,
                ..
            })
        ));
        assert_eq!(h.session.state(), StateKind::Spectate);
    }
}
