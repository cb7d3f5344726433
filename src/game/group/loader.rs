//! Staggered Set Loading
//!
//! Building a large set in one frame stalls input, so members are spawned
//! in batches of `ceil(total / frames_per_load)` per frame. The loader is a
//! plain resumable object the frame loop polls until it reports done.

use log::{debug, warn};

use crate::game::entity::EntityId;
use crate::game::save::SetData;
use crate::game::scene::Scene;

#[derive(Debug, Clone)]
pub struct StaggeredLoader {
    data: SetData,
    set: EntityId,
    next: usize,
    batch: usize,
    keep_editable: bool,
    finished: bool,
}

impl StaggeredLoader {
    /// Create the (editable) target set and prepare to fill it.
    pub fn new(scene: &mut Scene, data: SetData, frames_per_load: usize, keep_editable: bool) -> Self {
        let set = scene.create_set(&data.name);
        scene.initialize_editable(set);
        scene.apply_transform(set, &data.transform.to_local());
        if let Some(group) = scene.group_mut(set) {
            group.grid_center = data.local_grid_center;
        }
        if let Some(entity) = scene.get_mut(set) {
            entity.bound_size = data.bound_size;
            entity.bounds_offset = data.bounds_center_offset;
        }

        let total = data.pieces.len();
        let batch = total.div_ceil(frames_per_load.max(1)).max(1);
        debug!("[Loader] Loading `{}` into {}: {} pieces, {} per frame", data.name, set, total, batch);
        Self {
            data,
            set,
            next: 0,
            batch,
            keep_editable,
            finished: false,
        }
    }

    /// The set being filled.
    pub fn set(&self) -> EntityId {
        self.set
    }

    pub fn batch_size(&self) -> usize {
        self.batch
    }

    pub fn is_done(&self) -> bool {
        self.finished
    }

    /// Spawn the next batch of members. Unknown piece ids are skipped.
    /// Returns how many members were added.
    pub fn process_next_batch(&mut self, scene: &mut Scene) -> usize {
        if self.finished {
            return 0;
        }
        if !scene.contains(self.set) {
            warn!("[Loader] Target set {} disappeared, stopping", self.set);
            self.finished = true;
            return 0;
        }

        let end = (self.next + self.batch).min(self.data.pieces.len());
        let mut added = 0;
        for piece in &self.data.pieces[self.next..end] {
            let Ok(id) = scene.spawn_piece(&piece.id) else {
                debug!("[Loader] Skipping unknown piece `{}`", piece.id);
                continue;
            };
            if let Some(entity) = scene.get_mut(id) {
                if !piece.colors.is_empty() {
                    entity.colors = piece.colors.clone();
                }
                if !piece.textures.is_empty() {
                    entity.textures = piece.textures.clone();
                }
            }
            if scene.add_member_at(self.set, id, &piece.placable.to_local()) {
                added += 1;
            }
        }
        self.next = end;

        if self.next >= self.data.pieces.len() {
            self.finished = true;
            if self.keep_editable {
                scene.recompute_restrictions(self.set);
                scene.recompute_bounds(self.set, false);
            } else {
                scene.finalize(self.set);
            }
            debug!("[Loader] Finished `{}`", self.data.name);
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{PieceCatalog, PieceDefinition};
    use crate::game::entity::EntityKind;
    use crate::game::save::{PieceSaveData, PlacableData};
    use glam::Vec3;

    fn data(count: usize) -> SetData {
        SetData {
            name: "row".to_string(),
            bound_size: Vec3::ZERO,
            bounds_center_offset: Vec3::ZERO,
            local_grid_center: Vec3::ZERO,
            transform: PlacableData::default(),
            pieces: (0..count)
                .map(|i| PieceSaveData {
                    id: if i == 3 { "missing".to_string() } else { "crate".to_string() },
                    colors: Vec::new(),
                    textures: Vec::new(),
                    placable: PlacableData {
                        position: Vec3::new(i as f32 * 2.0, 0.0, 0.0),
                        ..PlacableData::default()
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn test_batches_spread_across_frames() {
        let mut scene = Scene::new(PieceCatalog::new().with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE)));
        let mut loader = StaggeredLoader::new(&mut scene, data(10), 4, false);
        assert_eq!(loader.batch_size(), 3);

        let mut frames = 0;
        let mut total = 0;
        while !loader.is_done() {
            total += loader.process_next_batch(&mut scene);
            frames += 1;
        }
        assert_eq!(frames, 4);
        // The unknown id is skipped
        assert_eq!(total, 9);
        assert_eq!(scene.group(loader.set()).map(|g| g.members.len()), Some(9));
        assert!(!scene.group(loader.set()).expect("set survives").editing);
    }

    fn placed_at(positions: &[Vec3], transform: PlacableData) -> SetData {
        SetData {
            transform,
            pieces: positions
                .iter()
                .map(|p| PieceSaveData {
                    id: "crate".to_string(),
                    colors: Vec::new(),
                    textures: Vec::new(),
                    placable: PlacableData {
                        position: *p,
                        ..PlacableData::default()
                    },
                })
                .collect(),
            ..data(0)
        }
    }

    fn load_all(scene: &mut Scene, data: SetData, frames: usize, keep_editable: bool) -> Vec<Vec3> {
        let mut loader = StaggeredLoader::new(scene, data, frames, keep_editable);
        while !loader.is_done() {
            loader.process_next_batch(scene);
        }
        let members = scene.group(loader.set()).map(|g| g.members.clone()).unwrap_or_default();
        members.iter().filter_map(|m| scene.world_position(*m)).collect()
    }

    #[test]
    fn test_members_keep_saved_positions() {
        let positions = [Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)];
        for keep_editable in [false, true] {
            let mut scene =
                Scene::new(PieceCatalog::new().with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE)));
            let world = load_all(&mut scene, placed_at(&positions, PlacableData::default()), 30, keep_editable);
            assert_eq!(world.len(), 2);
            for (got, want) in world.iter().zip(positions) {
                assert!((*got - want).length() < 1e-4, "{:?} != {:?}", got, want);
            }
        }
    }

    #[test]
    fn test_members_follow_set_transform_across_batches() {
        let mut scene = Scene::new(PieceCatalog::new().with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE)));
        let transform = PlacableData {
            position: Vec3::new(10.0, 0.0, 0.0),
            ..PlacableData::default()
        };
        let local = [Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0)];
        // One member per frame
        let world = load_all(&mut scene, placed_at(&local, transform), 3, false);
        let expected = [Vec3::new(10.0, 0.0, 0.0), Vec3::new(13.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 5.0)];
        assert_eq!(world.len(), 3);
        for (got, want) in world.iter().zip(expected) {
            assert!((*got - want).length() < 1e-4, "{:?} != {:?}", got, want);
        }
    }

    #[test]
    fn test_empty_set_finishes_immediately() {
        let mut scene = Scene::new(PieceCatalog::new());
        let mut loader = StaggeredLoader::new(&mut scene, data(0), 30, true);
        assert_eq!(loader.process_next_batch(&mut scene), 0);
        assert!(loader.is_done());
        assert!(scene.contains(loader.set()));
    }
}
