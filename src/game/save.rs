//! Save Data
//!
//! Already-deserialized set and piece records. The engine builds sets from
//! these and exports sets back into them; the file format around them is
//! the host's business.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, SplitRotation, from_euler_degrees, to_euler_degrees};
use super::scene::{LocalTransform, Scene};

/// Parent-relative transform with euler angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacableData {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for PlacableData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl PlacableData {
    pub fn to_local(&self) -> LocalTransform {
        LocalTransform {
            position: self.position,
            rotation: SplitRotation::from_base(from_euler_degrees(self.rotation)),
            scale: self.scale,
        }
    }

    pub fn from_local(transform: &LocalTransform) -> Self {
        Self {
            position: transform.position,
            rotation: to_euler_degrees((transform.rotation.base * transform.rotation.offset).normalize()),
            scale: transform.scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceSaveData {
    pub id: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub textures: Vec<String>,
    #[serde(default)]
    pub placable: PlacableData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetData {
    pub name: String,
    #[serde(default)]
    pub bound_size: Vec3,
    #[serde(default)]
    pub bounds_center_offset: Vec3,
    #[serde(default)]
    pub local_grid_center: Vec3,
    #[serde(default)]
    pub transform: PlacableData,
    #[serde(default)]
    pub pieces: Vec<PieceSaveData>,
}

impl SetData {
    pub fn from_json_str(json: &str) -> super::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Scene {
    /// Snapshot a set and its piece members.
    pub fn export_set(&self, set: EntityId) -> Option<SetData> {
        let group = self.group(set)?;
        let entity = self.get(set)?;
        let pieces = group
            .members
            .iter()
            .filter_map(|m| self.get(*m))
            .filter_map(|member| {
                Some(PieceSaveData {
                    id: member.piece_id.clone()?,
                    colors: member.colors.clone(),
                    textures: member.textures.clone(),
                    placable: PlacableData::from_local(&LocalTransform::of(member)),
                })
            })
            .collect();
        Some(SetData {
            name: group.name.clone(),
            bound_size: entity.bound_size,
            bounds_center_offset: entity.bounds_offset,
            local_grid_center: group.grid_center,
            transform: PlacableData::from_local(&LocalTransform::of(entity)),
            pieces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{PieceCatalog, PieceDefinition};
    use crate::game::entity::EntityKind;
    use crate::game::scene::PlaceRequest;

    #[test]
    fn test_export_set() {
        let mut scene = Scene::new(PieceCatalog::new().with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE)));
        let set = scene.create_set("shed");
        let piece = scene.spawn_piece("crate").expect("known piece");
        scene.place_at(piece, PlaceRequest::new(Vec3::new(2.0, 0.0, 0.0)));
        scene.add_member(set, piece);

        let data = scene.export_set(set).expect("set exists");
        assert_eq!(data.name, "shed");
        assert_eq!(data.pieces.len(), 1);
        assert_eq!(data.pieces[0].id, "crate");
        assert_eq!(data.transform.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(data.pieces[0].placable.position, Vec3::ZERO);
        assert_eq!(data.bound_size, Vec3::ONE);
    }

    #[test]
    fn test_set_data_from_json_defaults() {
        let data = SetData::from_json_str(r#"{"name":"empty"}"#).expect("valid set data");
        assert!(data.pieces.is_empty());
        assert_eq!(data.transform.scale, Vec3::ONE);
    }
}
