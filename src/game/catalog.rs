//! Piece Catalog
//!
//! Static definitions of every placeable piece: footprint, kind, snap
//! override, price and connector data. Entities are spawned from these.

use std::collections::BTreeMap;

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use super::error::Result;
use super::restriction::RestrictionSet;
use super::snap::SnapPolicy;
use super::stroke::{ConnectionDirection, StrokeCategory, StrokeType};

/// Which size drives a piece's `Scale`/`MinScale`/`RealScale`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ScaleAxis {
    /// Derived from the bounds (largest/smallest horizontal, largest overall)
    #[default]
    Bounds,
    X,
    Y,
    Z,
    Custom(f32),
}

/// Characteristic sizes of an entity footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleMetrics {
    /// Largest horizontal extent (grid cell for snapping)
    pub scale: f32,
    /// Smallest horizontal extent
    pub min_scale: f32,
    /// Largest extent on any axis
    pub real_scale: f32,
}

impl ScaleAxis {
    /// Metrics for a footprint of `size` (already scaled).
    pub fn metrics(&self, size: Vec3) -> ScaleMetrics {
        let single = |v: f32| ScaleMetrics {
            scale: v,
            min_scale: v,
            real_scale: v,
        };
        match self {
            ScaleAxis::Bounds => ScaleMetrics {
                scale: size.x.max(size.z),
                min_scale: size.x.min(size.z),
                real_scale: size.max_element(),
            },
            ScaleAxis::X => single(size.x),
            ScaleAxis::Y => single(size.y),
            ScaleAxis::Z => single(size.z),
            ScaleAxis::Custom(v) => single(*v),
        }
    }
}

/// Connector data of a stroke piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeData {
    pub category: StrokeCategory,
    pub archetype: StrokeType,
    /// Canonical connection directions in the piece's own frame
    pub directions: Vec<ConnectionDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceDefinition {
    pub id: String,
    pub kind: EntityKind,
    /// Unscaled footprint
    pub bound_size: Vec3,
    /// Bounds center relative to the pivot
    pub bounds_offset: Vec3,
    /// Snap override; `Default` uses the kind's snap
    #[serde(default)]
    pub snap: SnapPolicy,
    #[serde(default)]
    pub scale_axis: ScaleAxis,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub stroke: Option<StrokeData>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub textures: Vec<String>,
}

impl PieceDefinition {
    /// A piece whose pivot sits at the bottom center of its footprint.
    pub fn new(id: impl Into<String>, kind: EntityKind, bound_size: Vec3) -> Self {
        Self {
            id: id.into(),
            kind,
            bound_size,
            bounds_offset: Vec3::new(0.0, bound_size.y * 0.5, 0.0),
            snap: SnapPolicy::Default,
            scale_axis: ScaleAxis::Bounds,
            price: 0,
            stroke: None,
            colors: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// A stroke connector of `category`.
    pub fn connector(
        id: impl Into<String>,
        category: StrokeCategory,
        archetype: StrokeType,
        directions: Vec<ConnectionDirection>,
        bound_size: Vec3,
    ) -> Self {
        Self {
            stroke: Some(StrokeData {
                category,
                archetype,
                directions,
            }),
            ..Self::new(id, EntityKind::Stroke, bound_size)
        }
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = price;
        self
    }

    pub fn with_snap(mut self, snap: SnapPolicy) -> Self {
        self.snap = snap;
        self
    }

    pub fn with_scale_axis(mut self, axis: ScaleAxis) -> Self {
        self.scale_axis = axis;
        self
    }

    pub fn with_bounds_offset(mut self, offset: Vec3) -> Self {
        self.bounds_offset = offset;
        self
    }

    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = colors;
        self
    }

    /// The snap type entities of this piece use when asked for `Default`.
    pub fn own_snap(&self) -> SnapPolicy {
        self.snap.resolve(self.kind.capabilities().default_snap)
    }

    /// Metrics at a given entity scale.
    pub fn metrics(&self, scale: Vec3) -> ScaleMetrics {
        self.scale_axis.metrics((self.bound_size * scale).abs())
    }

    /// Kind restrictions, with the grid cell set to the piece's own scale
    /// when grid-locked.
    pub fn restrictions(&self, scale: Vec3) -> RestrictionSet {
        let mut restrictions = self.kind.capabilities().restrictions;
        if restrictions.is_grid_locked() {
            restrictions.position_grid = self.metrics(scale).scale;
        }
        restrictions
    }
}

/// Every piece known to the building system, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PieceCatalog {
    pieces: BTreeMap<String, PieceDefinition>,
}

impl PieceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style insert.
    pub fn with(mut self, piece: PieceDefinition) -> Self {
        self.insert(piece);
        self
    }

    pub fn insert(&mut self, piece: PieceDefinition) {
        self.pieces.insert(piece.id.clone(), piece);
    }

    pub fn get(&self, id: &str) -> Option<&PieceDefinition> {
        let piece = self.pieces.get(id);
        if piece.is_none() {
            debug!("[Catalog] Unknown piece id `{}`", id);
        }
        piece
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pieces.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The connector piece of `category` with the given archetype.
    pub fn archetype(&self, category: StrokeCategory, archetype: StrokeType) -> Option<&PieceDefinition> {
        self.pieces.values().find(|piece| {
            piece
                .stroke
                .as_ref()
                .is_some_and(|s| s.category == category && s.archetype == archetype)
        })
    }
}
